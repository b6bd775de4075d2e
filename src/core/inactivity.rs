//! Inactivity fallback for sessions without gaze tracking.
//!
//! When no tracker hardware is available the engine falls back to wall-clock
//! idle time: DOM-style activity events reset the clock, and sustained
//! silence walks the same warned / severe / terminated ladder as the
//! counter-driven path, on a much coarser timescale.

use crate::config::InactivityThresholds;
use crate::core::warning::{WarningEffect, WarningLevel};
use crate::signal::ActivityEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Snapshot of the idle clock, reported over the status surfaces.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ActivityState {
    pub idle_ms: i64,
    pub level: WarningLevel,
}

#[derive(Debug, Clone)]
pub struct InactivityMonitor {
    thresholds: InactivityThresholds,
    last_activity: DateTime<Utc>,
    level: WarningLevel,
    exited: bool,
}

impl InactivityMonitor {
    pub fn new(thresholds: InactivityThresholds, now: DateTime<Utc>) -> Self {
        Self {
            thresholds,
            last_activity: now,
            level: WarningLevel::Normal,
            exited: false,
        }
    }

    pub fn level(&self) -> WarningLevel {
        self.level
    }

    pub fn idle_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.last_activity).num_milliseconds().max(0)
    }

    pub fn state(&self, now: DateTime<Utc>) -> ActivityState {
        ActivityState {
            idle_ms: self.idle_ms(now),
            level: self.level,
        }
    }

    /// Record a user activity event. Any activity resets the idle clock and
    /// drops an elevated level straight back to normal; there is no
    /// acknowledgment step on this path.
    pub fn on_activity(&mut self, event: &ActivityEvent) -> Option<WarningEffect> {
        if self.level == WarningLevel::Terminated {
            return None;
        }
        self.last_activity = event.timestamp;
        if self.level > WarningLevel::Normal {
            self.level = WarningLevel::Normal;
            return Some(WarningEffect::Hide);
        }
        None
    }

    /// Advance the idle clock. Called once per second by the engine.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<WarningEffect> {
        if self.level == WarningLevel::Terminated {
            return None;
        }

        let idle = self.idle_ms(now);
        let candidate = if idle >= self.thresholds.terminate_ms {
            WarningLevel::Terminated
        } else if idle >= self.thresholds.severe_ms {
            WarningLevel::Severe
        } else if idle >= self.thresholds.warn_ms {
            WarningLevel::Warned
        } else {
            WarningLevel::Normal
        };

        if candidate > self.level {
            self.level = candidate;
            if candidate == WarningLevel::Terminated {
                self.exited = true;
                return Some(WarningEffect::ForceExit);
            }
            return Some(WarningEffect::Show(candidate));
        }
        None
    }

    pub fn is_terminated(&self) -> bool {
        self.exited
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::ActivityKind;
    use chrono::Duration;

    fn thresholds() -> InactivityThresholds {
        InactivityThresholds {
            warn_ms: 3_000,
            severe_ms: 30_000,
            terminate_ms: 180_000,
        }
    }

    #[test]
    fn test_quiet_session_walks_the_ladder() {
        let start = Utc::now();
        let mut mon = InactivityMonitor::new(thresholds(), start);

        assert_eq!(mon.tick(start + Duration::seconds(2)), None);
        assert_eq!(
            mon.tick(start + Duration::seconds(3)),
            Some(WarningEffect::Show(WarningLevel::Warned))
        );
        assert_eq!(mon.tick(start + Duration::seconds(10)), None);
        assert_eq!(
            mon.tick(start + Duration::seconds(30)),
            Some(WarningEffect::Show(WarningLevel::Severe))
        );
        assert_eq!(
            mon.tick(start + Duration::seconds(180)),
            Some(WarningEffect::ForceExit)
        );
        assert!(mon.is_terminated());
    }

    #[test]
    fn test_activity_resets_clock_and_level() {
        let start = Utc::now();
        let mut mon = InactivityMonitor::new(thresholds(), start);
        mon.tick(start + Duration::seconds(5));
        assert_eq!(mon.level(), WarningLevel::Warned);

        let ev = ActivityEvent {
            kind: ActivityKind::KeyPress,
            timestamp: start + Duration::seconds(6),
        };
        assert_eq!(mon.on_activity(&ev), Some(WarningEffect::Hide));
        assert_eq!(mon.level(), WarningLevel::Normal);

        // Clock restarted from the event, not from session start.
        assert_eq!(mon.tick(start + Duration::seconds(8)), None);
        assert_eq!(
            mon.tick(start + Duration::seconds(9)),
            Some(WarningEffect::Show(WarningLevel::Warned))
        );
    }

    #[test]
    fn test_activity_while_normal_emits_nothing() {
        let start = Utc::now();
        let mut mon = InactivityMonitor::new(thresholds(), start);
        let ev = ActivityEvent {
            kind: ActivityKind::MouseMove,
            timestamp: start + Duration::seconds(1),
        };
        assert_eq!(mon.on_activity(&ev), None);
    }

    #[test]
    fn test_terminated_ignores_further_activity() {
        let start = Utc::now();
        let mut mon = InactivityMonitor::new(thresholds(), start);
        assert_eq!(
            mon.tick(start + Duration::seconds(200)),
            Some(WarningEffect::ForceExit)
        );
        let ev = ActivityEvent {
            kind: ActivityKind::Click,
            timestamp: start + Duration::seconds(201),
        };
        assert_eq!(mon.on_activity(&ev), None);
        assert_eq!(mon.tick(start + Duration::seconds(400)), None);
        assert_eq!(mon.level(), WarningLevel::Terminated);
    }

    #[test]
    fn test_idle_clamps_negative_to_zero() {
        let start = Utc::now();
        let mon = InactivityMonitor::new(thresholds(), start);
        assert_eq!(mon.idle_ms(start - Duration::seconds(5)), 0);
    }
}
