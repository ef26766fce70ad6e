//! Generation core for maestro.
//!
//! Holds the pieces of the melodic loop that don't touch any device:
//!
//! - [`ContextWindow`] / [`WindowSnapshot`]: fixed-length rolling note history
//! - [`Predictor`]: boundary to the external sequence model
//! - [`NoteSampler`]: temperature sampling and timing clamps
//! - [`StopSignal`]: cooperative cancellation with interruptible waits
//!
//! # Example
//!
//! ```ignore
//! use maestro_core::{seed, ContextWindow, NoteSampler, SamplerConfig, VOCAB_SIZE};
//!
//! let mut window = ContextWindow::seed(&seed::c_major(25), 25, VOCAB_SIZE)?;
//! let mut sampler = NoteSampler::new(SamplerConfig::default())?;
//!
//! let prediction = predictor.predict(&window.snapshot(), 2.0)?;
//! let note = sampler.sample(&prediction)?;
//! window.append(&note);
//! ```

pub mod error;
pub use error::{Error, Result};

mod note;
pub use note::{note_name, NormalizedNote, Note, MAX_PITCH, VOCAB_SIZE};

mod context;
pub use context::{ContextWindow, WindowSnapshot};

mod predictor;
pub use predictor::{FnPredictor, PredictError, PredictFn, Prediction, Predictor};

mod sampler;
pub use sampler::{NoteSampler, SamplerConfig};

mod signal;
pub use signal::{StopHandle, StopSignal};

pub mod seed;
