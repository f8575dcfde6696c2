//! Fixed-rate timer running a task on a dedicated thread
//!
//! Ticks are aligned to `start + initial_delay + n * period`. If a task
//! overruns one or more periods the missed ticks are skipped instead of being
//! replayed back-to-back, so a slow publish never causes a burst.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

/// Smallest accepted period
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a running timer; cancelling (or dropping) it stops the thread
pub struct FixedRateTimer {
    cancel: Option<Sender<()>>,
}

impl FixedRateTimer {
    /// Start running `task` on a new thread named `name`
    ///
    /// # Arguments
    /// * `initial_delay` - Time before the first run
    /// * `period` - Time between consecutive scheduled runs
    pub fn schedule<F>(
        name: &str,
        initial_delay: Duration,
        period: Duration,
        mut task: F,
    ) -> Result<Self>
    where
        F: FnMut() + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        let (tx, rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut next = Instant::now() + initial_delay;
                loop {
                    let wait = next.saturating_duration_since(Instant::now());
                    match rx.recv_timeout(wait) {
                        Err(RecvTimeoutError::Timeout) => {}
                        // Cancelled, either explicitly or by dropping the handle
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }

                    task();

                    next += period;
                    let now = Instant::now();
                    if next <= now {
                        let behind = now.duration_since(next);
                        let skipped = (behind.as_nanos() / period.as_nanos()) as u32 + 1;
                        log::debug!("Timer overran, skipping {} tick(s)", skipped);
                        next += period * skipped;
                    }
                }
                log::debug!("Timer thread exiting");
            })
            .map_err(Error::TimerSpawn)?;

        Ok(Self { cancel: Some(tx) })
    }

    /// Stop scheduling further runs
    ///
    /// Returns immediately; a run already in progress finishes on its own
    /// thread but no new run starts afterwards.
    pub fn cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_none()
    }
}

impl Drop for FixedRateTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}
