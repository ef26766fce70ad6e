//! Error types for maestro-core.

use thiserror::Error;

/// Error type for generation-core operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid seed: expected {expected} notes, got {actual}")]
    InvalidSeed { expected: usize, actual: usize },

    #[error("Invalid temperature: {0}. Must be finite and greater than zero")]
    InvalidTemperature(f32),

    #[error("Invalid duration range: min={min}, max={max}")]
    InvalidDurationRange { min: f32, max: f32 },

    #[error("Model inference failed: {0}")]
    ModelInference(String),

    #[error("Seed parse error: {0}")]
    SeedParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors raised while validating startup configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::InvalidSeed { .. }
                | Error::InvalidTemperature(_)
                | Error::InvalidDurationRange { .. }
                | Error::SeedParse(_)
                | Error::Io(_)
        )
    }
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
