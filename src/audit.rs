//! Audit log for post-exam review.
//!
//! Counters are atomic so every pipeline thread can bump them through a
//! shared `Arc` without locking; the event trail sits behind a mutex and is
//! only touched when something reviewable happens. The whole log serializes
//! to a single JSON file per session.

use crate::core::warning::WarningLevel;
use crate::error::MonitorError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

/// A reviewable event with its timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditRecord {
    WarningShown {
        level: WarningLevel,
        timestamp: DateTime<Utc>,
    },
    WarningAcknowledged {
        level: WarningLevel,
        cleared: bool,
        timestamp: DateTime<Utc>,
    },
    PasteBlocked {
        formats: Vec<String>,
        timestamp: DateTime<Utc>,
    },
    MouseLeftWindow {
        timestamp: DateTime<Utc>,
    },
    FullscreenExited {
        timestamp: DateTime<Utc>,
    },
    ForcedExit {
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// Point-in-time counter totals.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AuditSnapshot {
    pub tracker_samples: u64,
    pub abnormal_samples: u64,
    pub warnings_shown: u64,
    pub acknowledgments: u64,
    pub blocked_pastes: u64,
    pub mouse_leave_violations: u64,
    pub fullscreen_violations: u64,
    pub forced_exits: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct AuditFile {
    session_id: Uuid,
    saved_at: DateTime<Utc>,
    counters: AuditSnapshot,
    trail: Vec<AuditRecord>,
}

#[derive(Debug, Default)]
pub struct AuditLog {
    tracker_samples: AtomicU64,
    abnormal_samples: AtomicU64,
    warnings_shown: AtomicU64,
    acknowledgments: AtomicU64,
    blocked_pastes: AtomicU64,
    mouse_leave_violations: AtomicU64,
    fullscreen_violations: AtomicU64,
    forced_exits: AtomicU64,
    trail: Mutex<Vec<AuditRecord>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count_sample(&self, abnormal: bool) {
        self.tracker_samples.fetch_add(1, Ordering::Relaxed);
        if abnormal {
            self.abnormal_samples.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record(&self, record: AuditRecord) {
        match &record {
            AuditRecord::WarningShown { .. } => {
                self.warnings_shown.fetch_add(1, Ordering::Relaxed);
            }
            AuditRecord::WarningAcknowledged { .. } => {
                self.acknowledgments.fetch_add(1, Ordering::Relaxed);
            }
            AuditRecord::PasteBlocked { .. } => {
                self.blocked_pastes.fetch_add(1, Ordering::Relaxed);
            }
            AuditRecord::MouseLeftWindow { .. } => {
                self.mouse_leave_violations.fetch_add(1, Ordering::Relaxed);
            }
            AuditRecord::FullscreenExited { .. } => {
                self.fullscreen_violations.fetch_add(1, Ordering::Relaxed);
            }
            AuditRecord::ForcedExit { .. } => {
                self.forced_exits.fetch_add(1, Ordering::Relaxed);
            }
        }
        if let Ok(mut trail) = self.trail.lock() {
            trail.push(record);
        }
    }

    pub fn snapshot(&self) -> AuditSnapshot {
        AuditSnapshot {
            tracker_samples: self.tracker_samples.load(Ordering::Relaxed),
            abnormal_samples: self.abnormal_samples.load(Ordering::Relaxed),
            warnings_shown: self.warnings_shown.load(Ordering::Relaxed),
            acknowledgments: self.acknowledgments.load(Ordering::Relaxed),
            blocked_pastes: self.blocked_pastes.load(Ordering::Relaxed),
            mouse_leave_violations: self.mouse_leave_violations.load(Ordering::Relaxed),
            fullscreen_violations: self.fullscreen_violations.load(Ordering::Relaxed),
            forced_exits: self.forced_exits.load(Ordering::Relaxed),
        }
    }

    pub fn trail(&self) -> Vec<AuditRecord> {
        self.trail
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    /// File the log is written to for a given session.
    pub fn file_path(data_dir: &Path, session_id: Uuid) -> PathBuf {
        data_dir.join(format!("audit-{session_id}.json"))
    }

    /// Persist counters and trail for the session.
    pub fn save(&self, data_dir: &Path, session_id: Uuid) -> Result<PathBuf, MonitorError> {
        std::fs::create_dir_all(data_dir)?;
        let path = Self::file_path(data_dir, session_id);
        let file = AuditFile {
            session_id,
            saved_at: Utc::now(),
            counters: self.snapshot(),
            trail: self.trail(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// Load a previously saved session log.
    pub fn load(path: &Path) -> Result<(AuditSnapshot, Vec<AuditRecord>), MonitorError> {
        let contents = std::fs::read_to_string(path)?;
        let file: AuditFile = serde_json::from_str(&contents)?;
        Ok((file.counters, file.trail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_counters_track_records() {
        let log = AuditLog::new();
        log.count_sample(false);
        log.count_sample(true);
        log.record(AuditRecord::WarningShown {
            level: WarningLevel::Warned,
            timestamp: Utc::now(),
        });
        log.record(AuditRecord::PasteBlocked {
            formats: vec![String::from("text/plain")],
            timestamp: Utc::now(),
        });

        let snap = log.snapshot();
        assert_eq!(snap.tracker_samples, 2);
        assert_eq!(snap.abnormal_samples, 1);
        assert_eq!(snap.warnings_shown, 1);
        assert_eq!(snap.blocked_pastes, 1);
        assert_eq!(snap.forced_exits, 0);
    }

    #[test]
    fn test_trail_preserves_order() {
        let log = AuditLog::new();
        let t = Utc::now();
        log.record(AuditRecord::MouseLeftWindow { timestamp: t });
        log.record(AuditRecord::ForcedExit {
            reason: String::from("inactivity"),
            timestamp: t,
        });
        let trail = log.trail();
        assert_eq!(trail.len(), 2);
        assert!(matches!(trail[0], AuditRecord::MouseLeftWindow { .. }));
        assert!(matches!(trail[1], AuditRecord::ForcedExit { .. }));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("examguard-audit-{}", Uuid::new_v4()));
        let session_id = Uuid::new_v4();

        let log = AuditLog::new();
        log.count_sample(true);
        log.record(AuditRecord::FullscreenExited {
            timestamp: Utc::now(),
        });

        let path = log.save(&dir, session_id).unwrap();
        let (counters, trail) = AuditLog::load(&path).unwrap();
        assert_eq!(counters, log.snapshot());
        assert_eq!(trail, log.trail());

        std::fs::remove_dir_all(&dir).ok();
    }
}
