//! Predictor abstraction: the boundary to the sequence model.
//!
//! The model itself (Keras export, ONNX, candle, ...) lives outside this
//! workspace. Implementations receive the normalized window by shared
//! reference and return raw outputs; all validation and clamping happens in
//! [`NoteSampler`](crate::NoteSampler).

use crate::context::WindowSnapshot;
use std::fmt;

/// Raw model output for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Unnormalized pitch scores, one per MIDI note.
    pub pitch_logits: Vec<f32>,
    /// Raw step prediction in seconds (may be negative).
    pub step: f32,
    /// Raw duration prediction in seconds (may be negative).
    pub duration: f32,
}

#[derive(Debug)]
pub enum PredictError {
    /// The model rejected the input shape.
    Shape { expected: [usize; 2], actual: [usize; 2] },
    /// Forward pass failed inside the backend.
    ForwardFailed(String),
    /// The backend is gone (thread died, session closed, ...).
    Unavailable(String),
}

impl fmt::Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape { expected, actual } => write!(
                f,
                "Input shape mismatch: expected {:?}, got {:?}",
                expected, actual
            ),
            Self::ForwardFailed(msg) => write!(f, "Forward pass failed: {}", msg),
            Self::Unavailable(msg) => write!(f, "Predictor unavailable: {}", msg),
        }
    }
}

impl std::error::Error for PredictError {}

/// Sequence model used by the generation loop.
///
/// Contract: a pure function of `(window, temperature, internal randomness)`.
/// Deterministic for a fixed internal seed. `temperature` is passed through
/// for models that apply it internally; the sampler applies it to the pitch
/// logits either way.
///
/// The predictor is moved into the orchestrator and only ever called from
/// the generation thread, so `Send` is the only bound.
pub trait Predictor: Send {
    fn predict(
        &mut self,
        window: &WindowSnapshot,
        temperature: f32,
    ) -> Result<Prediction, PredictError>;
}

impl<P: Predictor + ?Sized> Predictor for Box<P> {
    fn predict(
        &mut self,
        window: &WindowSnapshot,
        temperature: f32,
    ) -> Result<Prediction, PredictError> {
        (**self).predict(window, temperature)
    }
}

/// Forward closure: flat window data plus `[rows, 3]` shape in, prediction out.
pub type PredictFn =
    Box<dyn FnMut(&[f32], [usize; 2]) -> Result<Prediction, PredictError> + Send>;

/// [`Predictor`] backed by a closure over flat tensor data.
///
/// Lets an ML backend be plugged in without implementing the trait.
pub struct FnPredictor {
    forward: PredictFn,
}

impl FnPredictor {
    pub fn new(
        forward: impl FnMut(&[f32], [usize; 2]) -> Result<Prediction, PredictError> + Send + 'static,
    ) -> Self {
        Self {
            forward: Box::new(forward),
        }
    }
}

impl Predictor for FnPredictor {
    fn predict(
        &mut self,
        window: &WindowSnapshot,
        _temperature: f32,
    ) -> Result<Prediction, PredictError> {
        (self.forward)(&window.as_flat(), window.shape())
    }
}
