//! Configuration for the examguard monitor.

use crate::error::MonitorError;
use crate::signal::GazeSample;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Viewport bounds the gaze prediction is checked against.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
        }
    }
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether a gaze point falls inside `[0, width] x [0, height]`.
    pub fn contains(&self, sample: &GazeSample) -> bool {
        sample.x >= 0.0 && sample.x <= self.width && sample.y >= 0.0 && sample.y <= self.height
    }
}

/// Escalation thresholds for the counter-based warning machine.
///
/// These are tracker-tick counts, not wall-clock durations. At the assumed
/// sensor cadence the defaults line up with the 3s / 30s / 180s ladder used
/// by the inactivity fallback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    /// Counter value above which the first warning fires
    pub warn: u32,
    /// Counter value above which the severe warning fires
    pub severe: u32,
    /// Counter value above which the session is terminated
    pub terminate: u32,
    /// Counters must drop below this before an acknowledgment clears the level
    pub recovery: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            warn: 80,
            severe: 1600,
            terminate: 4800,
            recovery: 20,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.warn == 0 || self.warn >= self.severe || self.severe >= self.terminate {
            return Err(MonitorError::Config(format!(
                "thresholds must satisfy 0 < warn < severe < terminate (got {}/{}/{})",
                self.warn, self.severe, self.terminate
            )));
        }
        if self.recovery >= self.warn {
            return Err(MonitorError::Config(format!(
                "recovery threshold {} must be below warn threshold {}",
                self.recovery, self.warn
            )));
        }
        Ok(())
    }
}

/// Wall-clock thresholds for the no-sensor inactivity fallback.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InactivityThresholds {
    pub warn_ms: i64,
    pub severe_ms: i64,
    pub terminate_ms: i64,
}

impl Default for InactivityThresholds {
    fn default() -> Self {
        Self {
            warn_ms: 3_000,
            severe_ms: 30_000,
            terminate_ms: 180_000,
        }
    }
}

/// Which detectors are wired into the engine.
///
/// One parameterized engine replaces per-deployment variants: a deployment
/// without a webcam disables gaze tracking and relies on the inactivity
/// fallback, a plain editor embed may disable the fullscreen guard, etc.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GuardConfig {
    pub gaze_tracking: bool,
    pub clipboard_guard: bool,
    pub fullscreen_guard: bool,
    pub mouse_leave_guard: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            gaze_tracking: true,
            clipboard_guard: true,
            fullscreen_guard: true,
            mouse_leave_guard: true,
        }
    }
}

impl GuardConfig {
    /// Parse guard selection from a comma-separated string.
    pub fn from_csv(s: &str) -> Self {
        let names: Vec<String> = s.split(',').map(|s| s.trim().to_lowercase()).collect();
        let has = |name: &str| names.iter().any(|n| n == name || n == "all");

        Self {
            gaze_tracking: has("gaze"),
            clipboard_guard: has("clipboard"),
            fullscreen_guard: has("fullscreen"),
            mouse_leave_guard: has("mouse"),
        }
    }

    /// Check if at least one detector is enabled.
    pub fn any_enabled(&self) -> bool {
        self.gaze_tracking || self.clipboard_guard || self.fullscreen_guard || self.mouse_leave_guard
    }
}

/// Main configuration for the proctoring engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Viewport the gaze bounds check runs against
    pub viewport: Viewport,

    /// Counter-based escalation thresholds
    pub thresholds: Thresholds,

    /// Wall-clock thresholds for the inactivity fallback
    pub inactivity: InactivityThresholds,

    /// Enabled detectors
    pub guards: GuardConfig,

    /// Path for storing the audit log
    pub data_path: PathBuf,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("examguard");

        Self {
            viewport: Viewport::default(),
            thresholds: Thresholds::default(),
            inactivity: InactivityThresholds::default(),
            guards: GuardConfig::default(),
            data_path: data_dir,
        }
    }
}

impl MonitorConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, MonitorError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: MonitorConfig = serde_json::from_str(&content)?;
            config.thresholds.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), MonitorError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("examguard")
            .join("config.json")
    }

    /// Ensure the data directory exists.
    pub fn ensure_directories(&self) -> Result<(), MonitorError> {
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_config_parsing() {
        let guards = GuardConfig::from_csv("gaze,clipboard");
        assert!(guards.gaze_tracking);
        assert!(guards.clipboard_guard);
        assert!(!guards.fullscreen_guard);
        assert!(!guards.mouse_leave_guard);

        let guards = GuardConfig::from_csv("all");
        assert!(guards.gaze_tracking);
        assert!(guards.fullscreen_guard);
    }

    #[test]
    fn test_default_thresholds_valid() {
        assert!(Thresholds::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let bad = Thresholds {
            warn: 1600,
            severe: 80,
            terminate: 4800,
            recovery: 20,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_recovery_must_be_below_warn() {
        let bad = Thresholds {
            recovery: 80,
            ..Thresholds::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_viewport_bounds() {
        let viewport = Viewport::new(800.0, 600.0);
        assert!(viewport.contains(&GazeSample::new(400.0, 300.0)));
        assert!(viewport.contains(&GazeSample::new(0.0, 0.0)));
        assert!(viewport.contains(&GazeSample::new(800.0, 600.0)));
        assert!(!viewport.contains(&GazeSample::new(-1.0, 300.0)));
        assert!(!viewport.contains(&GazeSample::new(400.0, 601.0)));
    }
}
