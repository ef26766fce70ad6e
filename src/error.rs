//! Centralized error type for the maestro umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate
//! boundaries, and classifies them with [`ErrorKind`].

use crate::state::SessionState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] maestro_core::Error),

    #[error("Model inference: {0}")]
    Predict(#[from] maestro_core::PredictError),

    #[error("MIDI: {0}")]
    Midi(#[from] maestro_midi_io::Error),

    #[error("Gesture: {0}")]
    Gesture(#[from] maestro_gesture::Error),

    #[error("Broadcast: {0}")]
    Broadcast(#[from] maestro_broadcast::Error),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid session state: expected {expected}, was {actual}")]
    InvalidState {
        expected: SessionState,
        actual: SessionState,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// How an error should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad startup input. Raised before any device traffic.
    Configuration,
    /// Output port missing, closed, or rejecting notes. Fatal.
    Device,
    /// A single control, broadcast or gesture-frame failure. Logged and skipped.
    TransientIo,
    /// Predictor failure or malformed prediction. Fatal.
    ModelInference,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Core(maestro_core::Error::ModelInference(_)) | Error::Predict(_) => {
                ErrorKind::ModelInference
            }
            Error::Core(_) => ErrorKind::Configuration,

            Error::Midi(maestro_midi_io::Error::InvalidConfig(_)) => ErrorKind::Configuration,
            Error::Midi(_) => ErrorKind::Device,

            Error::Gesture(maestro_gesture::Error::InvalidConfig(_)) => ErrorKind::Configuration,
            Error::Gesture(maestro_gesture::Error::Midi(_)) => ErrorKind::Device,
            Error::Gesture(_) => ErrorKind::TransientIo,

            Error::Broadcast(
                maestro_broadcast::Error::Bind { .. } | maestro_broadcast::Error::InsideRuntime,
            ) => ErrorKind::Configuration,
            Error::Broadcast(_) => ErrorKind::TransientIo,

            Error::InvalidConfig(_)
            | Error::ConfigParse(_)
            | Error::InvalidState { .. }
            | Error::Io(_) => ErrorKind::Configuration,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() != ErrorKind::TransientIo
    }
}

pub type Result<T> = std::result::Result<T, Error>;
