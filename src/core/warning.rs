//! Warning-level state machine.
//!
//! Maps the accumulator's worst counter to an escalation level and produces
//! the UI-facing effects (show or hide the warning modal, force exit). The
//! machine owns the hysteresis rules: levels escalate as thresholds are
//! crossed upward, de-escalate only when the counter drains back under the
//! recovery floor, and `Terminated` is absorbing.

use crate::config::Thresholds;
use serde::{Deserialize, Serialize};

/// Escalation level, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum WarningLevel {
    #[default]
    Normal,
    Warned,
    Severe,
    Terminated,
}

impl WarningLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningLevel::Normal => "normal",
            WarningLevel::Warned => "warned",
            WarningLevel::Severe => "severe",
            WarningLevel::Terminated => "terminated",
        }
    }
}

impl std::fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Effect the caller must apply after feeding the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningEffect {
    /// Surface the warning modal at the given level
    Show(WarningLevel),
    /// Dismiss the modal
    Hide,
    /// End the session; emitted exactly once per session
    ForceExit,
}

/// Result of an acknowledge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// Counter below the recovery floor; level dropped to normal
    Cleared,
    /// Counter still elevated; modal hidden but the level stands
    Retained,
    /// Nothing to acknowledge
    Invalid,
}

#[derive(Debug, Clone)]
pub struct WarningMachine {
    thresholds: Thresholds,
    level: WarningLevel,
    modal_visible: bool,
    exited: bool,
}

impl WarningMachine {
    pub fn new(thresholds: Thresholds) -> Self {
        Self {
            thresholds,
            level: WarningLevel::Normal,
            modal_visible: false,
            exited: false,
        }
    }

    pub fn level(&self) -> WarningLevel {
        self.level
    }

    pub fn modal_visible(&self) -> bool {
        self.modal_visible
    }

    fn level_for(&self, count: u32) -> WarningLevel {
        if count > self.thresholds.terminate {
            WarningLevel::Terminated
        } else if count > self.thresholds.severe {
            WarningLevel::Severe
        } else if count > self.thresholds.warn {
            WarningLevel::Warned
        } else {
            WarningLevel::Normal
        }
    }

    /// Feed the current worst counter and whether the last sample was
    /// abnormal. Returns the effect the caller must apply, if any.
    ///
    /// Levels only move up from sampling; they come down through
    /// `acknowledge`. An abnormal sample while the modal is dismissed at an
    /// elevated level re-surfaces the modal at the retained level.
    pub fn evaluate(&mut self, worst: u32, was_abnormal: bool) -> Option<WarningEffect> {
        if self.level == WarningLevel::Terminated {
            return None;
        }

        let candidate = self.level_for(worst);
        if candidate > self.level {
            self.level = candidate;
            if candidate == WarningLevel::Terminated {
                self.modal_visible = false;
                self.exited = true;
                return Some(WarningEffect::ForceExit);
            }
            self.modal_visible = true;
            return Some(WarningEffect::Show(candidate));
        }

        // Dismissed but not recovered: a fresh abnormal sample brings the
        // modal straight back at the level already earned.
        if was_abnormal && !self.modal_visible && self.level > WarningLevel::Normal {
            self.modal_visible = true;
            return Some(WarningEffect::Show(self.level));
        }

        None
    }

    /// The candidate acknowledges the warning modal.
    pub fn acknowledge(&mut self, worst: u32) -> AckOutcome {
        if self.level == WarningLevel::Normal
            || self.level == WarningLevel::Terminated
            || !self.modal_visible
        {
            return AckOutcome::Invalid;
        }

        self.modal_visible = false;
        if worst < self.thresholds.recovery {
            self.level = WarningLevel::Normal;
            AckOutcome::Cleared
        } else {
            AckOutcome::Retained
        }
    }

    /// Force termination from outside the threshold path (guard violations).
    /// Returns `ForceExit` the first time only.
    pub fn force_exit(&mut self) -> Option<WarningEffect> {
        if self.exited {
            return None;
        }
        self.level = WarningLevel::Terminated;
        self.modal_visible = false;
        self.exited = true;
        Some(WarningEffect::ForceExit)
    }

    pub fn is_terminated(&self) -> bool {
        self.level == WarningLevel::Terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> WarningMachine {
        WarningMachine::new(Thresholds {
            warn: 80,
            severe: 1600,
            terminate: 4800,
            recovery: 20,
        })
    }

    #[test]
    fn test_stays_normal_at_warn_threshold() {
        // Thresholds are strict: the counter must exceed them.
        let mut m = machine();
        assert_eq!(m.evaluate(80, true), None);
        assert_eq!(m.level(), WarningLevel::Normal);
    }

    #[test]
    fn test_escalates_past_each_threshold() {
        let mut m = machine();
        assert_eq!(m.evaluate(81, true), Some(WarningEffect::Show(WarningLevel::Warned)));
        assert_eq!(m.evaluate(1601, true), Some(WarningEffect::Show(WarningLevel::Severe)));
        assert_eq!(m.evaluate(4801, true), Some(WarningEffect::ForceExit));
        assert_eq!(m.level(), WarningLevel::Terminated);
    }

    #[test]
    fn test_level_does_not_drop_from_sampling_alone() {
        let mut m = machine();
        m.evaluate(81, true);
        // Counter drained, but no acknowledgment yet: level stands.
        assert_eq!(m.evaluate(0, false), None);
        assert_eq!(m.level(), WarningLevel::Warned);
    }

    #[test]
    fn test_acknowledge_below_recovery_clears() {
        let mut m = machine();
        m.evaluate(81, true);
        assert_eq!(m.acknowledge(15), AckOutcome::Cleared);
        assert_eq!(m.level(), WarningLevel::Normal);
        assert!(!m.modal_visible());
    }

    #[test]
    fn test_acknowledge_above_recovery_retains_level() {
        let mut m = machine();
        m.evaluate(81, true);
        assert_eq!(m.acknowledge(41), AckOutcome::Retained);
        assert_eq!(m.level(), WarningLevel::Warned);
        assert!(!m.modal_visible());
    }

    #[test]
    fn test_acknowledge_recovery_boundary() {
        // Recovery is strict as well: exactly 20 is not recovered yet.
        let mut m = machine();
        m.evaluate(81, true);
        assert_eq!(m.acknowledge(20), AckOutcome::Retained);
        m.evaluate(21, true);
        assert_eq!(m.acknowledge(19), AckOutcome::Cleared);
    }

    #[test]
    fn test_abnormal_sample_after_retained_ack_resurfaces_modal() {
        let mut m = machine();
        m.evaluate(81, true);
        m.acknowledge(41);
        assert_eq!(
            m.evaluate(42, true),
            Some(WarningEffect::Show(WarningLevel::Warned))
        );
        assert!(m.modal_visible());
    }

    #[test]
    fn test_good_sample_after_retained_ack_stays_hidden() {
        let mut m = machine();
        m.evaluate(81, true);
        m.acknowledge(41);
        assert_eq!(m.evaluate(40, false), None);
        assert!(!m.modal_visible());
    }

    #[test]
    fn test_acknowledge_with_no_visible_modal_is_invalid() {
        let mut m = machine();
        assert_eq!(m.acknowledge(0), AckOutcome::Invalid);
        m.evaluate(81, true);
        m.acknowledge(10);
        assert_eq!(m.acknowledge(0), AckOutcome::Invalid);
    }

    #[test]
    fn test_terminated_is_absorbing() {
        let mut m = machine();
        m.evaluate(4801, true);
        assert_eq!(m.evaluate(0, false), None);
        assert_eq!(m.evaluate(5000, true), None);
        assert_eq!(m.acknowledge(0), AckOutcome::Invalid);
        assert!(m.is_terminated());
    }

    #[test]
    fn test_force_exit_fires_exactly_once() {
        let mut m = machine();
        assert_eq!(m.force_exit(), Some(WarningEffect::ForceExit));
        assert_eq!(m.force_exit(), None);
        assert_eq!(m.evaluate(4801, true), None);
    }

    #[test]
    fn test_threshold_exit_then_force_exit_does_not_double_fire() {
        let mut m = machine();
        m.evaluate(4801, true);
        assert_eq!(m.force_exit(), None);
    }

    #[test]
    fn test_skips_levels_on_large_jump() {
        let mut m = machine();
        // A counter can land past severe in one evaluation after a long gap.
        assert_eq!(
            m.evaluate(2000, true),
            Some(WarningEffect::Show(WarningLevel::Severe))
        );
    }
}
