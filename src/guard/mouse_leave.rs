//! Mouse-leave guard.
//!
//! A `mouseout` whose related target is null means the pointer crossed the
//! window boundary rather than moving between elements. The one exception is
//! a hidden document: tab switches fire the same event shape and are the
//! fullscreen guard's problem, not this one's.

use crate::signal::MouseLeaveEvent;

#[derive(Debug, Clone, Default)]
pub struct MouseLeaveGuard {
    violations: u64,
}

impl MouseLeaveGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the event counts as leaving the exam window.
    pub fn on_event(&mut self, event: &MouseLeaveEvent) -> bool {
        if event.related_target_is_null && !event.document_hidden {
            self.violations += 1;
            true
        } else {
            false
        }
    }

    pub fn violations(&self) -> u64 {
        self.violations
    }
}
