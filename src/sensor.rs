//! Event sources.
//!
//! Browser-side instrumentation ultimately delivers events over HTTP, but
//! the engine itself only ever sees a crossbeam channel. An `EventSource`
//! owns whatever produces events on the sending side; the engine drains the
//! receiving side on its own thread.

use crate::error::MonitorError;
use crate::signal::ProctorEvent;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// Bounded so a stalled engine backpressures the producer instead of
/// growing without limit.
pub const CHANNEL_CAPACITY: usize = 256;

pub fn event_channel() -> (Sender<ProctorEvent>, Receiver<ProctorEvent>) {
    bounded(CHANNEL_CAPACITY)
}

pub trait EventSource: Send {
    fn name(&self) -> &'static str;
    fn start(&mut self, tx: Sender<ProctorEvent>) -> Result<(), MonitorError>;
    fn stop(&mut self);
}

/// Produces nothing. Used when events arrive through the HTTP surface and
/// the engine just needs a live channel.
#[derive(Debug, Default)]
pub struct NoopSource {
    running: bool,
}

impl NoopSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSource for NoopSource {
    fn name(&self) -> &'static str {
        "noop"
    }

    fn start(&mut self, _tx: Sender<ProctorEvent>) -> Result<(), MonitorError> {
        if self.running {
            return Err(MonitorError::SensorAlreadyRunning);
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
    }
}

/// Replays a recorded session from a JSON-lines file, one `ProctorEvent`
/// per line. Timestamps come from the file, so downstream behavior is
/// deterministic regardless of replay speed.
#[derive(Debug)]
pub struct ReplaySource {
    path: PathBuf,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ReplaySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }
}

impl EventSource for ReplaySource {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn start(&mut self, tx: Sender<ProctorEvent>) -> Result<(), MonitorError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(MonitorError::SensorAlreadyRunning);
        }

        let file = std::fs::File::open(&self.path)?;
        let running = Arc::clone(&self.running);
        let path = self.path.clone();

        let handle = std::thread::spawn(move || {
            let reader = BufReader::new(file);
            let mut sent = 0u64;
            for (lineno, line) in reader.lines().enumerate() {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        warn!(error = %e, "replay read failed, stopping");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<ProctorEvent>(&line) {
                    Ok(event) => {
                        if tx.send(event).is_err() {
                            break;
                        }
                        sent += 1;
                    }
                    Err(e) => {
                        warn!(line = lineno + 1, error = %e, "skipping malformed event");
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
            debug!(path = %path.display(), sent, "replay finished");
        });

        self.handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{GazeSample, TrackerSample};
    use std::io::Write;

    #[test]
    fn test_noop_rejects_double_start() {
        let (tx, _rx) = event_channel();
        let mut source = NoopSource::new();
        assert!(source.start(tx.clone()).is_ok());
        assert!(matches!(
            source.start(tx),
            Err(MonitorError::SensorAlreadyRunning)
        ));
    }

    #[test]
    fn test_noop_can_restart_after_stop() {
        let (tx, _rx) = event_channel();
        let mut source = NoopSource::new();
        source.start(tx.clone()).unwrap();
        source.stop();
        assert!(source.start(tx).is_ok());
    }

    #[test]
    fn test_replay_streams_events_and_skips_garbage() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("examguard-replay-{}.jsonl", uuid::Uuid::new_v4()));
        {
            let mut f = std::fs::File::create(&path).unwrap();
            let event = ProctorEvent::Tracker(TrackerSample {
                gaze: Some(GazeSample::new(10.0, 20.0)),
                timestamp: chrono::Utc::now(),
            });
            writeln!(f, "{}", serde_json::to_string(&event).unwrap()).unwrap();
            writeln!(f, "not json").unwrap();
            writeln!(f, "{}", serde_json::to_string(&event).unwrap()).unwrap();
        }

        let (tx, rx) = event_channel();
        let mut source = ReplaySource::new(&path);
        source.start(tx).unwrap();

        let mut received = 0;
        while let Ok(_event) = rx.recv_timeout(std::time::Duration::from_secs(2)) {
            received += 1;
        }
        assert_eq!(received, 2);

        source.stop();
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_replay_missing_file_errors() {
        let (tx, _rx) = event_channel();
        let mut source = ReplaySource::new("/nonexistent/events.jsonl");
        assert!(source.start(tx).is_err());
    }
}
