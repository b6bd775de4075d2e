//! The proctoring engine.
//!
//! One parameterized engine replaces per-deployment monitor variants: the
//! accumulator, warning machine, inactivity fallback and guards are all wired
//! behind `MonitorConfig` toggles. Events go in through a single `handle`
//! entry point; what comes out is a list of directives the front-end must
//! apply. The engine never renders anything and never touches the network.

use crate::audit::{AuditLog, AuditRecord, AuditSnapshot};
use crate::config::MonitorConfig;
use crate::core::{
    AckOutcome, ActivityAccumulator, InactivityMonitor, WarningEffect, WarningLevel, WarningMachine,
};
use crate::error::MonitorError;
use crate::guard::{ClipboardGuard, FullscreenGuard, FullscreenVerdict, MouseLeaveGuard, PasteVerdict};
use crate::session::{CalibrationProgress, Session};
use crate::signal::{ClipboardPayload, ProctorEvent};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Why a session was forcibly ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Sustained gaze or face infractions crossed the terminate threshold
    GazeThreshold,
    /// Wall-clock inactivity crossed the terminate threshold
    Inactivity,
    /// Explicit operator request
    Operator,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::GazeThreshold => "gaze_threshold",
            ExitReason::Inactivity => "inactivity",
            ExitReason::Operator => "operator",
        }
    }
}

/// An action the front-end must apply in response to ingested events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Directive {
    /// Surface the warning modal at the given level
    ShowWarning { level: WarningLevel },
    /// Dismiss the warning modal
    DismissWarning,
    /// Write this payload to the system clipboard (copy path)
    TagClipboard { payload: ClipboardPayload },
    /// Let the paste through
    AllowPaste,
    /// Suppress the paste and notify the candidate
    BlockPaste { formats: Vec<String> },
    /// Remind the candidate to keep the pointer in the exam window
    ShowFocusReminder,
    /// Show the blocking re-enter-fullscreen modal
    RequireFullscreen,
    /// Hide the fullscreen modal
    DismissFullscreenPrompt,
    /// End the session now
    ForceExit { reason: ExitReason },
}

/// Point-in-time engine state, reported over the status surfaces.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub session_id: Uuid,
    pub calibrated: bool,
    pub sensor_ready: bool,
    pub ended: bool,
    pub warning_level: WarningLevel,
    pub modal_visible: bool,
    pub gaze_out_of_bounds: u32,
    pub face_out_of_bounds: u32,
    pub idle_ms: i64,
    pub counters: AuditSnapshot,
}

pub struct ProctorEngine {
    config: MonitorConfig,
    session: Session,
    accumulator: ActivityAccumulator,
    warning: WarningMachine,
    inactivity: InactivityMonitor,
    clipboard: ClipboardGuard,
    mouse_leave: MouseLeaveGuard,
    fullscreen: FullscreenGuard,
    fullscreen_modal_visible: bool,
    audit: Arc<AuditLog>,
}

impl ProctorEngine {
    pub fn new(config: MonitorConfig) -> Self {
        let now = Utc::now();
        Self {
            session: Session::new(config.viewport),
            accumulator: ActivityAccumulator::new(config.viewport),
            warning: WarningMachine::new(config.thresholds),
            inactivity: InactivityMonitor::new(config.inactivity, now),
            clipboard: ClipboardGuard::new(),
            mouse_leave: MouseLeaveGuard::new(),
            fullscreen: FullscreenGuard::new(),
            fullscreen_modal_visible: false,
            audit: Arc::new(AuditLog::new()),
            config,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn audit(&self) -> Arc<AuditLog> {
        Arc::clone(&self.audit)
    }

    pub fn warning_level(&self) -> WarningLevel {
        if self.config.guards.gaze_tracking {
            self.warning.level()
        } else {
            self.inactivity.level()
        }
    }

    /// Record one gaze sample against the current calibration point.
    ///
    /// A calibration sample is proof the sensor is delivering, so the first
    /// one also flips the sensor-ready half of the monitoring gate.
    pub fn record_calibration_sample(
        &mut self,
        point_index: usize,
    ) -> Result<CalibrationProgress, MonitorError> {
        let progress = self.session.calibration_mut().record_sample(point_index)?;
        self.session.set_sensor_ready(true);
        if progress.complete {
            info!(session = %self.session.id(), "calibration complete, monitoring enabled");
        }
        Ok(progress)
    }

    /// Ingest one event. Events must be fed in arrival order.
    pub fn handle(&mut self, event: &ProctorEvent) -> Vec<Directive> {
        match event {
            ProctorEvent::Tracker(sample) => {
                if !self.config.guards.gaze_tracking || !self.session.monitoring_enabled() {
                    debug!("tracker sample dropped, monitoring not active");
                    return vec![];
                }
                let outcome = self.accumulator.on_sample(sample);
                self.audit.count_sample(outcome.is_abnormal());

                match self.warning.evaluate(self.accumulator.worst(), outcome.is_abnormal()) {
                    Some(WarningEffect::Show(level)) => {
                        warn!(%level, worst = self.accumulator.worst(), "warning raised");
                        self.audit.record(AuditRecord::WarningShown {
                            level,
                            timestamp: sample.timestamp,
                        });
                        vec![Directive::ShowWarning { level }]
                    }
                    Some(WarningEffect::Hide) => vec![Directive::DismissWarning],
                    Some(WarningEffect::ForceExit) => {
                        self.finish_exit(ExitReason::GazeThreshold, sample.timestamp)
                    }
                    None => vec![],
                }
            }

            ProctorEvent::Activity(activity) => {
                if self.config.guards.gaze_tracking || self.session.is_ended() {
                    return vec![];
                }
                match self.inactivity.on_activity(activity) {
                    Some(WarningEffect::Hide) => vec![Directive::DismissWarning],
                    _ => vec![],
                }
            }

            ProctorEvent::Copy { selection, .. } => {
                if !self.config.guards.clipboard_guard {
                    return vec![];
                }
                let selection = selection.as_deref().unwrap_or("");
                match self.clipboard.on_copy(selection) {
                    Some(payload) => vec![Directive::TagClipboard { payload }],
                    None => vec![],
                }
            }

            ProctorEvent::Paste { clipboard, timestamp } => {
                if !self.config.guards.clipboard_guard {
                    return vec![Directive::AllowPaste];
                }
                match self.clipboard.check_paste(clipboard.as_ref()) {
                    PasteVerdict::Allowed => vec![Directive::AllowPaste],
                    PasteVerdict::Blocked { formats } => {
                        warn!(?formats, "external paste blocked");
                        self.audit.record(AuditRecord::PasteBlocked {
                            formats: formats.clone(),
                            timestamp: *timestamp,
                        });
                        vec![Directive::BlockPaste { formats }]
                    }
                }
            }

            ProctorEvent::MouseLeave(leave) => {
                // A fullscreen transition fires a spurious mouseout; while the
                // fullscreen modal is up that guard owns the situation.
                if !self.config.guards.mouse_leave_guard || self.fullscreen_modal_visible {
                    return vec![];
                }
                if self.mouse_leave.on_event(leave) {
                    info!("pointer left the exam window");
                    self.audit.record(AuditRecord::MouseLeftWindow {
                        timestamp: leave.timestamp,
                    });
                    vec![Directive::ShowFocusReminder]
                } else {
                    vec![]
                }
            }

            ProctorEvent::Fullscreen(fs) => {
                if !self.config.guards.fullscreen_guard {
                    return vec![];
                }
                match self.fullscreen.on_event(fs) {
                    FullscreenVerdict::Exited => {
                        warn!("fullscreen lost");
                        self.fullscreen_modal_visible = true;
                        self.audit.record(AuditRecord::FullscreenExited {
                            timestamp: fs.timestamp,
                        });
                        vec![Directive::RequireFullscreen]
                    }
                    FullscreenVerdict::Reentered => {
                        self.fullscreen_modal_visible = false;
                        vec![Directive::DismissFullscreenPrompt]
                    }
                    FullscreenVerdict::Initialized | FullscreenVerdict::NoChange => vec![],
                }
            }
        }
    }

    /// Advance the inactivity fallback clock. No-op when gaze tracking is
    /// the active path.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Directive> {
        if self.config.guards.gaze_tracking || self.session.is_ended() {
            return vec![];
        }
        match self.inactivity.tick(now) {
            Some(WarningEffect::Show(level)) => {
                warn!(%level, idle_ms = self.inactivity.idle_ms(now), "inactivity warning");
                self.audit.record(AuditRecord::WarningShown { level, timestamp: now });
                vec![Directive::ShowWarning { level }]
            }
            Some(WarningEffect::ForceExit) => self.finish_exit(ExitReason::Inactivity, now),
            _ => vec![],
        }
    }

    /// The candidate acknowledges the warning modal.
    pub fn acknowledge(&mut self) -> AckOutcome {
        let level = self.warning.level();
        let outcome = self.warning.acknowledge(self.accumulator.worst());
        if outcome != AckOutcome::Invalid {
            self.audit.record(AuditRecord::WarningAcknowledged {
                level,
                cleared: outcome == AckOutcome::Cleared,
                timestamp: Utc::now(),
            });
        }
        outcome
    }

    /// End the session from outside the threshold paths. Idempotent.
    pub fn force_exit(&mut self, reason: ExitReason) -> Vec<Directive> {
        if self.session.is_ended() {
            return vec![];
        }
        self.finish_exit(reason, Utc::now())
    }

    /// Terminal teardown: activity state back to initial values, calibration
    /// gate closed. The next session must recalibrate from scratch.
    fn finish_exit(&mut self, reason: ExitReason, timestamp: DateTime<Utc>) -> Vec<Directive> {
        warn!(reason = reason.as_str(), session = %self.session.id(), "forced exit");
        self.audit.record(AuditRecord::ForcedExit {
            reason: reason.as_str().to_string(),
            timestamp,
        });
        self.accumulator.reset();
        self.warning = WarningMachine::new(self.config.thresholds);
        self.inactivity = InactivityMonitor::new(self.config.inactivity, timestamp);
        self.session.invalidate();
        vec![Directive::ForceExit { reason }]
    }

    /// Discard the current session and start fresh. The audit log carries
    /// over; counters are cumulative across resets within one process.
    pub fn reset(&mut self) {
        let now = Utc::now();
        info!(old_session = %self.session.id(), "session reset");
        self.session = Session::new(self.config.viewport);
        self.accumulator = ActivityAccumulator::new(self.config.viewport);
        self.warning = WarningMachine::new(self.config.thresholds);
        self.inactivity = InactivityMonitor::new(self.config.inactivity, now);
        self.clipboard = ClipboardGuard::new();
        self.mouse_leave = MouseLeaveGuard::new();
        self.fullscreen = FullscreenGuard::new();
        self.fullscreen_modal_visible = false;
    }

    pub fn status(&self, now: DateTime<Utc>) -> EngineStatus {
        EngineStatus {
            session_id: self.session.id(),
            calibrated: self.session.is_calibrated(),
            sensor_ready: self.session.sensor_ready(),
            ended: self.session.is_ended(),
            warning_level: self.warning_level(),
            modal_visible: self.warning.modal_visible(),
            gaze_out_of_bounds: self.accumulator.gaze_out_of_bounds(),
            face_out_of_bounds: self.accumulator.face_out_of_bounds(),
            idle_ms: self.inactivity.idle_ms(now),
            counters: self.audit.snapshot(),
        }
    }
}
