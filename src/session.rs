//! Exam session lifecycle and the calibration gate.
//!
//! A session starts uncalibrated. The candidate walks a fixed grid of nine
//! screen points, holding their gaze on each until three samples are
//! recorded, in order. Only a fully calibrated session feeds the tracker
//! pipeline; everything before that is setup, not evidence.

use crate::config::Viewport;
use crate::error::MonitorError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Calibration grid positions as fractions of the viewport, row by row.
pub const CALIBRATION_POINTS: [(f64, f64); 9] = [
    (0.05, 0.05),
    (0.5, 0.05),
    (0.95, 0.05),
    (0.05, 0.5),
    (0.5, 0.5),
    (0.95, 0.5),
    (0.05, 0.95),
    (0.5, 0.95),
    (0.95, 0.95),
];

/// Samples required at each point before advancing to the next.
pub const SAMPLES_PER_POINT: u8 = 3;

/// Progress report after recording a calibration sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalibrationProgress {
    /// Index of the point the next sample should target
    pub point_index: usize,
    /// Samples recorded at that point so far
    pub samples_at_point: u8,
    pub complete: bool,
}

#[derive(Debug, Clone)]
pub struct CalibrationGate {
    viewport: Viewport,
    current_point: usize,
    samples_at_point: u8,
    complete: bool,
}

impl CalibrationGate {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            current_point: 0,
            samples_at_point: 0,
            complete: false,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Pixel coordinates of the point the candidate should look at next,
    /// or `None` once calibration is done.
    pub fn target(&self) -> Option<(f64, f64)> {
        if self.complete {
            return None;
        }
        let (fx, fy) = CALIBRATION_POINTS[self.current_point];
        Some((fx * self.viewport.width, fy * self.viewport.height))
    }

    /// Record one gaze sample against a point. Points must be visited in
    /// grid order; a sample claiming any other point is rejected.
    pub fn record_sample(&mut self, point_index: usize) -> Result<CalibrationProgress, MonitorError> {
        if self.complete || point_index != self.current_point {
            return Err(MonitorError::InvalidCalibrationPoint(point_index));
        }

        self.samples_at_point += 1;
        if self.samples_at_point >= SAMPLES_PER_POINT {
            self.samples_at_point = 0;
            self.current_point += 1;
            if self.current_point >= CALIBRATION_POINTS.len() {
                self.complete = true;
            }
        }

        Ok(CalibrationProgress {
            point_index: self.current_point.min(CALIBRATION_POINTS.len() - 1),
            samples_at_point: self.samples_at_point,
            complete: self.complete,
        })
    }

    pub fn progress(&self) -> CalibrationProgress {
        CalibrationProgress {
            point_index: self.current_point.min(CALIBRATION_POINTS.len() - 1),
            samples_at_point: self.samples_at_point,
            complete: self.complete,
        }
    }
}

/// A single exam session from first calibration sample to forced exit or
/// submission.
#[derive(Debug, Clone)]
pub struct Session {
    id: Uuid,
    started_at: DateTime<Utc>,
    calibration: CalibrationGate,
    sensor_ready: bool,
    ended: bool,
}

impl Session {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: Utc::now(),
            calibration: CalibrationGate::new(viewport),
            sensor_ready: false,
            ended: false,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn calibration(&self) -> &CalibrationGate {
        &self.calibration
    }

    pub fn calibration_mut(&mut self) -> &mut CalibrationGate {
        &mut self.calibration
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration.is_complete()
    }

    pub fn sensor_ready(&self) -> bool {
        self.sensor_ready
    }

    /// Mark the gaze sensor as delivering samples.
    pub fn set_sensor_ready(&mut self, ready: bool) {
        self.sensor_ready = ready;
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// The sample pipeline is wired to the accumulator only behind this
    /// two-state gate: the sensor must be delivering and the candidate must
    /// have finished calibration, in a session that is still running.
    pub fn monitoring_enabled(&self) -> bool {
        self.is_calibrated() && self.sensor_ready && !self.ended
    }

    pub fn end(&mut self) {
        self.ended = true;
    }

    /// Tear the session down after a forced exit: the calibration gate
    /// closes again, so a fresh session must recalibrate from scratch.
    pub fn invalidate(&mut self) {
        let viewport = self.calibration.viewport();
        self.calibration = CalibrationGate::new(viewport);
        self.sensor_ready = false;
        self.ended = true;
    }
}
