//! Activity accumulator: turns the raw tracker stream into two saturating
//! counters representing sustained abnormality.
//!
//! Recovery is a leaky bucket rather than a reset: one good sample undoes one
//! bad sample. A single good frame in the middle of a genuine distraction
//! barely dents the counter, while a brief tracking glitch drains away within
//! a few ticks.

use crate::config::Viewport;
use crate::signal::TrackerSample;
use chrono::{DateTime, Utc};

/// What a single tracker tick contributed to the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// No face detected; face counter incremented, gaze not evaluated
    FaceMissing,
    /// Face detected but gaze outside the viewport; gaze counter incremented
    GazeOutOfBounds,
    /// Face detected and gaze in bounds; both counters decayed
    InBounds,
}

impl SampleOutcome {
    pub fn is_abnormal(&self) -> bool {
        !matches!(self, SampleOutcome::InBounds)
    }
}

/// Saturating infraction counters fed one tracker tick at a time.
#[derive(Debug, Clone)]
pub struct ActivityAccumulator {
    viewport: Viewport,
    gaze_out_of_bounds: u32,
    face_out_of_bounds: u32,
    last_active: DateTime<Utc>,
}

impl ActivityAccumulator {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            gaze_out_of_bounds: 0,
            face_out_of_bounds: 0,
            last_active: Utc::now(),
        }
    }

    /// Consume one tracker tick.
    ///
    /// A face-missing tick increments the face counter and does not evaluate
    /// gaze bounds. A face-present tick evaluates the gaze point against the
    /// viewport and decays the face counter. Counters never go below zero.
    pub fn on_sample(&mut self, sample: &TrackerSample) -> SampleOutcome {
        let outcome = match &sample.gaze {
            None => {
                self.face_out_of_bounds = self.face_out_of_bounds.saturating_add(1);
                SampleOutcome::FaceMissing
            }
            Some(gaze) => {
                self.face_out_of_bounds = self.face_out_of_bounds.saturating_sub(1);
                if self.viewport.contains(gaze) {
                    self.gaze_out_of_bounds = self.gaze_out_of_bounds.saturating_sub(1);
                    SampleOutcome::InBounds
                } else {
                    self.gaze_out_of_bounds = self.gaze_out_of_bounds.saturating_add(1);
                    SampleOutcome::GazeOutOfBounds
                }
            }
        };

        self.last_active = sample.timestamp;
        outcome
    }

    pub fn gaze_out_of_bounds(&self) -> u32 {
        self.gaze_out_of_bounds
    }

    pub fn face_out_of_bounds(&self) -> u32 {
        self.face_out_of_bounds
    }

    /// The larger of the two counters, which drives the warning level.
    pub fn worst(&self) -> u32 {
        self.gaze_out_of_bounds.max(self.face_out_of_bounds)
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        self.last_active
    }

    /// Reset both counters to zero (session teardown).
    pub fn reset(&mut self) {
        self.gaze_out_of_bounds = 0;
        self.face_out_of_bounds = 0;
        self.last_active = Utc::now();
    }
}
