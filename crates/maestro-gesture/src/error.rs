//! Error types for the gesture control stream.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Gesture source error: {0}")]
    Source(String),

    #[error("Invalid control config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Midi(#[from] maestro_midi_io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
