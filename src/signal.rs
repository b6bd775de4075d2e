//! Event types consumed by the proctoring engine.
//!
//! Every signal a browser front-end can report is modeled here: gaze tracker
//! ticks, generic DOM activity, clipboard copy/paste, pointer-left-window and
//! fullscreen-state changes. The unified [`ProctorEvent`] enum carries all of
//! them through a single ingest path, in strict arrival order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Clipboard format name written on copy and checked on paste.
///
/// Content carrying this format was copied from inside the exam editor;
/// anything without it is treated as external.
pub const CLIPBOARD_MARKER_FORMAT: &str = "application/x-examguard-internal";

/// A single gaze prediction from the eye tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeSample {
    /// Predicted x coordinate in viewport pixels
    pub x: f64,
    /// Predicted y coordinate in viewport pixels
    pub y: f64,
    /// Timestamp when the prediction was produced
    pub timestamp: DateTime<Utc>,
}

impl GazeSample {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            timestamp: Utc::now(),
        }
    }

    pub fn at(x: f64, y: f64, timestamp: DateTime<Utc>) -> Self {
        Self { x, y, timestamp }
    }
}

/// One tick from the gaze tracker.
///
/// `gaze: None` signals face-not-detected for that tick, per the sensor
/// callback contract.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerSample {
    /// Gaze prediction, absent when no face was detected
    pub gaze: Option<GazeSample>,
    /// Timestamp of the tracker tick
    pub timestamp: DateTime<Utc>,
}

impl TrackerSample {
    /// A tick where the face was detected and a gaze point predicted.
    pub fn detected(x: f64, y: f64) -> Self {
        let now = Utc::now();
        Self {
            gaze: Some(GazeSample::at(x, y, now)),
            timestamp: now,
        }
    }

    /// A tick where no face was detected.
    pub fn face_missing() -> Self {
        Self {
            gaze: None,
            timestamp: Utc::now(),
        }
    }

    pub fn face_present(&self) -> bool {
        self.gaze.is_some()
    }
}

/// Generic DOM activity kinds used by the inactivity fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    MouseDown,
    MouseMove,
    KeyPress,
    Scroll,
    TouchStart,
    Click,
}

/// A qualifying DOM activity event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub timestamp: DateTime<Utc>,
}

impl ActivityEvent {
    pub fn new(kind: ActivityKind) -> Self {
        Self {
            kind,
            timestamp: Utc::now(),
        }
    }
}

/// Snapshot of the clipboard contents as seen by a paste handler.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipboardPayload {
    /// Available clipboard format names
    pub formats: Vec<String>,
    /// Plain-text content, if any
    pub text: Option<String>,
}

impl ClipboardPayload {
    /// Payload as written by the editor's own copy handler: marker format
    /// plus plain text, in the same clipboard transaction.
    pub fn tagged(text: impl Into<String>) -> Self {
        Self {
            formats: vec![
                CLIPBOARD_MARKER_FORMAT.to_string(),
                "text/plain".to_string(),
            ],
            text: Some(text.into()),
        }
    }

    /// Plain-text payload with no provenance marker (external origin).
    pub fn external(text: impl Into<String>) -> Self {
        Self {
            formats: vec!["text/plain".to_string()],
            text: Some(text.into()),
        }
    }

    pub fn has_marker(&self) -> bool {
        self.formats.iter().any(|f| f == CLIPBOARD_MARKER_FORMAT)
    }
}

/// A native mouseout observed at the document root.
///
/// A null `relatedTarget` on the native event means the pointer left the
/// window rather than moving between elements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseLeaveEvent {
    pub related_target_is_null: bool,
    pub document_hidden: bool,
    pub timestamp: DateTime<Utc>,
}

impl MouseLeaveEvent {
    pub fn left_window() -> Self {
        Self {
            related_target_is_null: true,
            document_hidden: false,
            timestamp: Utc::now(),
        }
    }
}

/// A fullscreenchange observation (standard or vendor-prefixed source).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FullscreenEvent {
    pub is_fullscreen: bool,
    pub timestamp: DateTime<Utc>,
}

impl FullscreenEvent {
    pub fn new(is_fullscreen: bool) -> Self {
        Self {
            is_fullscreen,
            timestamp: Utc::now(),
        }
    }
}

/// Unified event type for the engine's ingest path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProctorEvent {
    Tracker(TrackerSample),
    Activity(ActivityEvent),
    Copy {
        selection: Option<String>,
        timestamp: DateTime<Utc>,
    },
    Paste {
        clipboard: Option<ClipboardPayload>,
        timestamp: DateTime<Utc>,
    },
    MouseLeave(MouseLeaveEvent),
    Fullscreen(FullscreenEvent),
}

impl ProctorEvent {
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ProctorEvent::Tracker(e) => e.timestamp,
            ProctorEvent::Activity(e) => e.timestamp,
            ProctorEvent::Copy { timestamp, .. } => *timestamp,
            ProctorEvent::Paste { timestamp, .. } => *timestamp,
            ProctorEvent::MouseLeave(e) => e.timestamp,
            ProctorEvent::Fullscreen(e) => e.timestamp,
        }
    }
}
