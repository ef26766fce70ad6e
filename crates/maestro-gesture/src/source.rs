//! Gesture sources: the tracker boundary plus camera-free stand-ins.

use crate::error::{Error, Result};
use crate::sample::{GestureLabel, GestureSample};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Produces one sample per call, or `None` when no hand is visible.
///
/// Implementations wrap a camera plus landmark detector. All calls happen
/// on the producer thread.
pub trait GestureSource: Send {
    /// Called once on the producer thread before the first sample.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }

    fn next_sample(&mut self) -> Result<Option<GestureSample>>;

    /// Called once when the producer exits its loop.
    fn release(&mut self) {}
}

impl<S: GestureSource + ?Sized> GestureSource for Box<S> {
    fn warm_up(&mut self) -> Result<()> {
        (**self).warm_up()
    }

    fn next_sample(&mut self) -> Result<Option<GestureSample>> {
        (**self).next_sample()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

const SIMULATED_LABELS: [GestureLabel; 4] = [
    GestureLabel::OpenPalm,
    GestureLabel::PeaceSign,
    GestureLabel::RockOn,
    GestureLabel::ClosedFist,
];

/// Deterministic automation with no camera.
///
/// X ramps once per second, Y 1.5x faster, pinch 2x faster (over the
/// 0-0.3 pinch range), at 20 ticks per second. The label cycles through
/// open palm, peace, rock on and fist every `label_period` ticks.
#[derive(Debug, Clone)]
pub struct SimulatedGestureSource {
    step: u64,
    label_period: u64,
}

impl SimulatedGestureSource {
    pub fn new() -> Self {
        Self {
            step: 0,
            label_period: 40,
        }
    }

    pub fn with_label_period(mut self, ticks: u64) -> Self {
        self.label_period = ticks.max(1);
        self
    }
}

impl Default for SimulatedGestureSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureSource for SimulatedGestureSource {
    fn next_sample(&mut self) -> Result<Option<GestureSample>> {
        let t = self.step as f32 / 20.0;
        let label =
            SIMULATED_LABELS[((self.step / self.label_period) % SIMULATED_LABELS.len() as u64) as usize];
        self.step += 1;

        Ok(Some(GestureSample::new(
            t % 1.0,
            (t * 1.5) % 1.0,
            0.3 * ((t * 2.0) % 1.0),
            label,
        )))
    }
}

/// One scripted frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptedFrame {
    Hand(GestureSample),
    NoHand,
    Error(String),
}

impl From<GestureSample> for ScriptedFrame {
    fn from(sample: GestureSample) -> Self {
        ScriptedFrame::Hand(sample)
    }
}

/// Replays a fixed list of frames, then reports no hand forever.
#[derive(Debug, Clone)]
pub struct ScriptedGestureSource {
    frames: VecDeque<ScriptedFrame>,
    warm_up_error: Option<String>,
    consumed: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl ScriptedGestureSource {
    pub fn new(frames: impl IntoIterator<Item = ScriptedFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
            warm_up_error: None,
            consumed: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn from_samples(samples: impl IntoIterator<Item = GestureSample>) -> Self {
        Self::new(samples.into_iter().map(ScriptedFrame::Hand))
    }

    /// Make `warm_up` fail with `message`.
    pub fn failing_warm_up(mut self, message: impl Into<String>) -> Self {
        self.warm_up_error = Some(message.into());
        self
    }

    /// Shared count of frames handed out so far.
    pub fn consumed(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.consumed)
    }

    /// Shared count of `release` calls.
    pub fn released(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.released)
    }
}

impl GestureSource for ScriptedGestureSource {
    fn warm_up(&mut self) -> Result<()> {
        match self.warm_up_error {
            Some(ref message) => Err(Error::Source(message.clone())),
            None => Ok(()),
        }
    }

    fn next_sample(&mut self) -> Result<Option<GestureSample>> {
        let Some(frame) = self.frames.pop_front() else {
            return Ok(None);
        };
        self.consumed.fetch_add(1, Ordering::Release);
        match frame {
            ScriptedFrame::Hand(sample) => Ok(Some(sample)),
            ScriptedFrame::NoHand => Ok(None),
            ScriptedFrame::Error(message) => Err(Error::Source(message)),
        }
    }

    fn release(&mut self) {
        self.released.fetch_add(1, Ordering::Release);
    }
}
