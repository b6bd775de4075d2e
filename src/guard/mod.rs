//! Focus and clipboard guards.
//!
//! Each guard consumes one kind of browser-originated event and decides
//! whether it constitutes a violation. Guards hold only the state they need
//! to make that call; escalation policy lives in the engine.

pub mod clipboard;
pub mod fullscreen;
pub mod mouse_leave;

pub use clipboard::{ClipboardGuard, PasteVerdict};
pub use fullscreen::{FullscreenGuard, FullscreenVerdict};
pub use mouse_leave::MouseLeaveGuard;
