//! examguard: proctoring monitor engine for browser-based coding exams.
//!
//! The engine consumes signals reported by an exam front-end (gaze tracker
//! ticks, DOM activity, clipboard events, pointer and fullscreen changes)
//! and emits the directives the front-end must apply: warning modals,
//! paste decisions, fullscreen prompts and forced exits.
//!
//! ```text
//!   browser front-end                     examguard agent
//!   ┌──────────────┐   ProctorEvent    ┌─────────────────────────┐
//!   │ tracker      │ ───────────────▶  │ sensor channel          │
//!   │ DOM hooks    │   (HTTP /ingest   │   ▼                     │
//!   │ clipboard    │    or replay)     │ ProctorEngine           │
//!   └──────────────┘                   │  ├ calibration gate     │
//!          ▲                           │  ├ accumulator          │
//!          │  Directive                │  ├ warning machine      │
//!          └────────────────────────── │  ├ inactivity fallback  │
//!                                      │  └ guards               │
//!                                      │   ▼                     │
//!                                      │ audit log (JSON)        │
//!                                      └─────────────────────────┘
//! ```
//!
//! The library has no UI and no network dependency of its own; the optional
//! `server` feature adds the local HTTP agent and `grader` adds the
//! submission client.

pub mod audit;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod guard;
pub mod session;
pub mod sensor;
pub mod signal;

#[cfg(feature = "grader")]
pub mod grader;

#[cfg(feature = "server")]
pub mod server;

pub use audit::{AuditLog, AuditRecord, AuditSnapshot};
pub use config::{GuardConfig, InactivityThresholds, MonitorConfig, Thresholds, Viewport};
pub use crate::core::{
    AckOutcome, ActivityAccumulator, InactivityMonitor, WarningLevel, WarningMachine,
};
pub use engine::{Directive, EngineStatus, ExitReason, ProctorEngine};
pub use error::MonitorError;
pub use session::{CalibrationGate, CalibrationProgress, Session};
pub use signal::{ProctorEvent, TrackerSample};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shown to the candidate before monitoring starts. Consent is a front-end
/// concern, but the canonical wording lives with the engine so every surface
/// shows the same text.
pub const PROCTORING_NOTICE: &str = "\
This exam session is proctored. While the exam is running, the system \
monitors gaze position (if a camera is available), keyboard and mouse \
activity, clipboard usage, and window focus. Copying content from outside \
the exam is blocked. Repeated violations end the session automatically. \
No video is recorded; only derived signals and counters are stored.";
