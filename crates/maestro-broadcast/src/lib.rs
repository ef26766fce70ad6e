//! Note event broadcasting for maestro viewers.
//!
//! [`EventBroadcaster`] owns the set of connected viewers and pushes one JSON
//! text message per performed note to each of them. Delivery is
//! best-effort: a failed viewer is dropped and the caller never blocks.
//!
//! ```ignore
//! let broadcaster = EventBroadcaster::serve(&BroadcastConfig::default())?;
//! broadcaster.broadcast(&VisualizationEvent::new(&note, 80, 0));
//! broadcaster.shutdown();
//! ```

pub mod error;
pub use error::{Error, Result};

mod event;
pub use event::VisualizationEvent;

mod broadcaster;
pub use broadcaster::{BroadcastOutcome, ClientConnection, ClientId, EventBroadcaster, Subscription};

mod server;
pub use server::{BroadcastConfig, DEFAULT_BIND_ADDR, DEFAULT_CLIENT_QUEUE};
