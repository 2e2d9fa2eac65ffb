//! Busy-indicator animation loop.
//!
//! While a transcription request is outstanding the tray cycles through a
//! short sweep of pointer frames. The loop runs on its own thread on a
//! fixed cadence; stopping joins the thread, so a late frame can never
//! overwrite whatever state the caller sets next.

use std::sync::Arc;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::Duration;

use murmur_core::IndicatorState;
use tracing::warn;

use crate::session::Indicator;

/// Number of discrete frames in the sweep, 30 degrees apart.
pub const FRAME_COUNT: u8 = 12;

/// Cadence of the animation loop.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(100);

pub struct Spinner {
    stop_tx: Sender<()>,
    thread: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Shows the first busy frame immediately and spawns the animation
    /// loop. The session controller creates exactly one spinner per
    /// processing phase.
    pub fn start(indicator: Arc<dyn Indicator>) -> Self {
        indicator.set(IndicatorState::Busy(0));
        let (stop_tx, stop_rx) = mpsc::channel();
        let thread = std::thread::Builder::new()
            .name("busy-spinner".into())
            .spawn(move || {
                let mut frame: u8 = 0;
                loop {
                    match stop_rx.recv_timeout(FRAME_INTERVAL) {
                        Err(RecvTimeoutError::Timeout) => {
                            frame = (frame + 1) % FRAME_COUNT;
                            indicator.set(IndicatorState::Busy(frame));
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
            })
            .map_err(|e| warn!("failed to spawn spinner thread: {e}"))
            .ok();
        Self { stop_tx, thread }
    }

    /// Signals the animation loop to exit and waits for it to finish. Runs
    /// once per processing phase, on success and failure paths alike.
    pub fn stop(self) {
        self.stop_tx.send(()).ok();
        if let Some(thread) = self.thread {
            if thread.join().is_err() {
                warn!("spinner thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::thread::sleep;

    use super::*;

    #[derive(Default)]
    struct FrameLog(Mutex<Vec<IndicatorState>>);

    impl Indicator for FrameLog {
        fn set(&self, state: IndicatorState) {
            self.0.lock().unwrap().push(state);
        }
    }

    #[test]
    fn frames_advance_cyclically_until_stopped() {
        let log = Arc::new(FrameLog::default());
        let spinner = Spinner::start(log.clone());
        sleep(FRAME_INTERVAL * 4);
        spinner.stop();

        let states = log.0.lock().unwrap();
        assert_eq!(states.first(), Some(&IndicatorState::Busy(0)));
        assert!(
            states.len() >= 3,
            "expected several frames, got {}",
            states.len()
        );
        for pair in states.windows(2) {
            let (IndicatorState::Busy(a), IndicatorState::Busy(b)) = (pair[0], pair[1]) else {
                panic!("non-busy frame in {:?}", pair);
            };
            assert_eq!(b, (a + 1) % FRAME_COUNT);
        }
    }

    #[test]
    fn stop_is_synchronous() {
        let log = Arc::new(FrameLog::default());
        let spinner = Spinner::start(log.clone());
        sleep(FRAME_INTERVAL * 2);
        spinner.stop();

        let frames_at_stop = log.0.lock().unwrap().len();
        sleep(FRAME_INTERVAL * 3);
        assert_eq!(log.0.lock().unwrap().len(), frames_at_stop);
    }
}
