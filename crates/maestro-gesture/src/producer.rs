//! Background control-change producer.
//!
//! Reads gesture samples on its own thread at a fixed rate, maps them to
//! controller values, and sends the ones that survive dedup through the
//! shared [`OutputDevice`].

use crate::error::{Error, Result};
use crate::mapping::{ControlMap, ControlMapper};
use crate::source::GestureSource;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError};
use maestro_core::StopSignal;
use maestro_midi_io::{cc::DEFAULT_DEDUP_THRESHOLD, CcDeduplicator, OutputDevice};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Send rate in Hz.
    pub rate_hz: f32,
    pub smoothing_window: usize,
    pub dedup_threshold: u8,
    pub channel: u8,
    pub map: ControlMap,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            rate_hz: 20.0,
            smoothing_window: 5,
            dedup_threshold: DEFAULT_DEDUP_THRESHOLD,
            channel: 0,
            map: ControlMap::default(),
        }
    }
}

impl ControlConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.rate_hz.is_finite()
            || self.rate_hz <= 0.0
            || Duration::try_from_secs_f32(1.0 / self.rate_hz).is_err()
        {
            return Err(Error::InvalidConfig(format!(
                "rate_hz must be positive, got {}",
                self.rate_hz
            )));
        }
        if self.smoothing_window == 0 {
            return Err(Error::InvalidConfig(
                "smoothing_window must be at least 1".to_string(),
            ));
        }
        if self.channel > 15 {
            return Err(Error::InvalidConfig(format!(
                "channel {} out of range 0-15",
                self.channel
            )));
        }
        self.map.validate()
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs_f32(1.0 / self.rate_hz)
    }
}

/// Counters for one producer run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ControlStats {
    /// Samples with a hand in them.
    pub samples: u64,
    pub sent: u64,
    /// Dropped by dedup.
    pub suppressed: u64,
    pub failed: u64,
}

#[derive(Debug, Default)]
struct StatsCounters {
    samples: AtomicU64,
    sent: AtomicU64,
    suppressed: AtomicU64,
    failed: AtomicU64,
}

impl StatsCounters {
    fn snapshot(&self) -> ControlStats {
        ControlStats {
            samples: self.samples.load(Ordering::Relaxed),
            sent: self.sent.load(Ordering::Relaxed),
            suppressed: self.suppressed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

pub struct ControlStreamProducer {
    stop: StopSignal,
    done: Receiver<()>,
    handle: Option<JoinHandle<()>>,
    stats: Arc<StatsCounters>,
}

impl ControlStreamProducer {
    /// Start the producer thread.
    pub fn spawn(
        source: Box<dyn GestureSource>,
        device: Arc<OutputDevice>,
        config: ControlConfig,
    ) -> Result<Self> {
        config.validate()?;

        let stop = StopSignal::new();
        let stats = Arc::new(StatsCounters::default());
        // The thread holds the sender; it disconnects when the thread exits.
        let (done_tx, done_rx) = bounded::<()>(1);

        let thread_stop = stop.clone();
        let thread_stats = Arc::clone(&stats);
        let handle = thread::Builder::new()
            .name("maestro-control".to_string())
            .spawn(move || {
                let _done = done_tx;
                run_control_loop(source, device, config, thread_stop, thread_stats);
            })?;

        Ok(Self {
            stop,
            done: done_rx,
            handle: Some(handle),
            stats,
        })
    }

    pub fn stats(&self) -> ControlStats {
        self.stats.snapshot()
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.done.try_recv(), Err(crossbeam_channel::TryRecvError::Disconnected))
    }

    /// Ask the thread to stop and wait up to `timeout` for it.
    ///
    /// Returns `false` if the thread did not finish in time. It keeps
    /// running until its current sample returns; a later call may join it,
    /// and dropping the producer detaches it. Calling again after a
    /// successful stop returns `true`.
    pub fn stop(&mut self, timeout: Duration) -> bool {
        self.stop.stop();

        let Some(handle) = self.handle.take() else {
            return true;
        };

        match self.done.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Control producer did not stop within {:?}",
                    timeout
                );
                self.handle = Some(handle);
                false
            }
            _ => {
                if handle.join().is_err() {
                    warn!("Control producer thread panicked");
                }
                true
            }
        }
    }
}

impl Drop for ControlStreamProducer {
    fn drop(&mut self) {
        self.stop.stop();
    }
}

fn run_control_loop(
    mut source: Box<dyn GestureSource>,
    device: Arc<OutputDevice>,
    config: ControlConfig,
    stop: StopSignal,
    stats: Arc<StatsCounters>,
) {
    if let Err(e) = source.warm_up() {
        warn!("Gesture source warm-up failed, control stream disabled: {}", e);
        return;
    }

    let interval = config.interval();
    let dedup = CcDeduplicator::new(config.dedup_threshold);
    let mut mapper = ControlMapper::new(config.map, config.channel, config.smoothing_window);

    info!(
        "Control stream started ({} Hz, {} controllers)",
        config.rate_hz,
        mapper.map().controllers().len()
    );

    while !stop.is_stopped() {
        let tick = Instant::now();

        match source.next_sample() {
            Ok(Some(sample)) => {
                stats.samples.fetch_add(1, Ordering::Relaxed);
                for (key, value) in mapper.map_sample(&sample) {
                    if !dedup.should_send(key, value) {
                        stats.suppressed.fetch_add(1, Ordering::Relaxed);
                        continue;
                    }
                    match device.send_cc(key.cc, value, key.channel) {
                        Ok(()) => {
                            dedup.record_sent(key, value);
                            stats.sent.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => {
                            stats.failed.fetch_add(1, Ordering::Relaxed);
                            debug!("{} send failed: {}", key, e);
                        }
                    }
                }
            }
            Ok(None) => {}
            Err(e) => debug!("Gesture frame skipped: {}", e),
        }

        if stop.wait_timeout(interval.saturating_sub(tick.elapsed())) {
            break;
        }
    }

    source.release();
    let s = stats.snapshot();
    info!(
        "Control stream stopped: {} samples, {} sent, {} suppressed, {} failed",
        s.samples, s.sent, s.suppressed, s.failed
    );
}
