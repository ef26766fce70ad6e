//! Cooperative stop signal with interruptible waits.
//!
//! Every wait in the system (settling delay, note sleep, control-rate pacing)
//! goes through [`StopSignal::wait_timeout`], so a single `stop()` wakes all
//! of them at once. Waking is done by dropping the only sender of a
//! zero-capacity channel: every cloned receiver observes the disconnect.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cloneable stop flag. All clones observe the same `stop()`.
#[derive(Clone)]
pub struct StopSignal {
    stopped: Arc<AtomicBool>,
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    wake: Receiver<()>,
}

impl StopSignal {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
            trigger: Arc::new(Mutex::new(Some(tx))),
            wake: rx,
        }
    }

    /// Request a stop. Idempotent.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
        self.trigger.lock().take();
    }

    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Sleep for `timeout` unless stopped first.
    ///
    /// Returns `true` if the signal was (or became) stopped.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_stopped() {
            return true;
        }
        match self.wake.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => self.is_stopped(),
            Err(RecvTimeoutError::Disconnected) | Ok(()) => true,
        }
    }
}

/// Handle given to callers outside the session to request a stop.
pub type StopHandle = StopSignal;

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StopSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopSignal")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}
