//! Error types for the event broadcaster.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Broadcaster is shut down")]
    Shutdown,

    #[error("The visualization server needs its own runtime; call serve() outside async code")]
    InsideRuntime,
}

pub type Result<T> = std::result::Result<T, Error>;
