//! Clipboard provenance guard.
//!
//! Every copy made inside the exam editor is tagged with a private clipboard
//! format. A paste is allowed only when that marker is present, which means
//! the content provably originated in this session. Anything else, including
//! payloads the browser refused to expose at all, is rejected. The guard
//! fails closed.

use crate::signal::ClipboardPayload;

/// Verdict for a single paste attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteVerdict {
    /// Marker present; content came from inside the session
    Allowed,
    /// No marker, an empty format list, or no readable clipboard
    Blocked { formats: Vec<String> },
}

impl PasteVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, PasteVerdict::Allowed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClipboardGuard {
    internal_copies: u64,
    allowed_pastes: u64,
    blocked_pastes: u64,
}

impl ClipboardGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag a copy made inside the editor. Returns the payload to hand to the
    /// system clipboard, marker included. An empty selection writes nothing.
    pub fn on_copy(&mut self, selection: &str) -> Option<ClipboardPayload> {
        if selection.is_empty() {
            return None;
        }
        self.internal_copies += 1;
        Some(ClipboardPayload::tagged(selection))
    }

    /// Decide a paste attempt. Only the marker matters; the text itself is
    /// never inspected. An unreadable clipboard (`None`) is blocked.
    pub fn check_paste(&mut self, payload: Option<&ClipboardPayload>) -> PasteVerdict {
        match payload {
            Some(p) if p.has_marker() => {
                self.allowed_pastes += 1;
                PasteVerdict::Allowed
            }
            Some(p) => {
                self.blocked_pastes += 1;
                PasteVerdict::Blocked {
                    formats: p.formats.clone(),
                }
            }
            None => {
                self.blocked_pastes += 1;
                PasteVerdict::Blocked { formats: vec![] }
            }
        }
    }

    pub fn internal_copies(&self) -> u64 {
        self.internal_copies
    }

    pub fn allowed_pastes(&self) -> u64 {
        self.allowed_pastes
    }

    pub fn blocked_pastes(&self) -> u64 {
        self.blocked_pastes
    }
}
