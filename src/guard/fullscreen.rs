//! Fullscreen guard.
//!
//! Browsers fire a fullscreenchange as soon as the page requests fullscreen
//! at session start, so the first event only establishes a baseline. After
//! that, leaving fullscreen is a violation and re-entering clears it.

use crate::signal::FullscreenEvent;

/// What a fullscreenchange event meant for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FullscreenVerdict {
    /// First event of the session; baseline recorded
    Initialized,
    /// Left fullscreen; violation
    Exited,
    /// Back in fullscreen after a violation
    Reentered,
    /// State unchanged
    NoChange,
}

#[derive(Debug, Clone, Default)]
pub struct FullscreenGuard {
    initialized: bool,
    is_fullscreen: bool,
    violations: u64,
}

impl FullscreenGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_event(&mut self, event: &FullscreenEvent) -> FullscreenVerdict {
        if !self.initialized {
            self.initialized = true;
            self.is_fullscreen = event.is_fullscreen;
            return FullscreenVerdict::Initialized;
        }

        if event.is_fullscreen == self.is_fullscreen {
            return FullscreenVerdict::NoChange;
        }

        self.is_fullscreen = event.is_fullscreen;
        if event.is_fullscreen {
            FullscreenVerdict::Reentered
        } else {
            self.violations += 1;
            FullscreenVerdict::Exited
        }
    }

    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    pub fn violations(&self) -> u64 {
        self.violations
    }
}
