//! WebSocket accept loop on a private tokio runtime.

use crate::broadcaster::{Outbound, Registry};
use crate::error::{Error, Result};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::runtime::{Handle, Runtime};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8765";

/// Unread events buffered per viewer before new ones are skipped.
pub const DEFAULT_CLIENT_QUEUE: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    pub bind_addr: String,
    /// Runtime worker threads.
    pub worker_threads: usize,
    /// Per-viewer queue capacity.
    pub client_queue: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            worker_threads: 2,
            client_queue: DEFAULT_CLIENT_QUEUE,
        }
    }
}

pub(crate) struct ServerHandle {
    runtime: Runtime,
    shutdown: watch::Sender<bool>,
    local_addr: SocketAddr,
}

impl ServerHandle {
    pub(crate) fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub(crate) fn shutdown(self) {
        let _ = self.shutdown.send(true);
        // Blocking on shutdown panics inside another runtime's context
        if Handle::try_current().is_ok() {
            self.runtime.shutdown_background();
        } else {
            self.runtime.shutdown_timeout(Duration::from_millis(500));
        }
    }
}

pub(crate) fn start(config: &BroadcastConfig, registry: Arc<Registry>) -> Result<ServerHandle> {
    if Handle::try_current().is_ok() {
        return Err(Error::InsideRuntime);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.worker_threads.max(1))
        .thread_name("maestro-broadcast")
        .enable_all()
        .build()?;

    let listener = runtime
        .block_on(TcpListener::bind(&config.bind_addr))
        .map_err(|source| Error::Bind {
            addr: config.bind_addr.clone(),
            source,
        })?;
    let local_addr = listener.local_addr()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    runtime.spawn(accept_loop(listener, registry, shutdown_rx));

    Ok(ServerHandle {
        runtime,
        shutdown: shutdown_tx,
        local_addr,
    })
}

async fn accept_loop(
    listener: TcpListener,
    registry: Arc<Registry>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tokio::spawn(serve_client(
                        stream,
                        peer,
                        Arc::clone(&registry),
                        shutdown.clone(),
                    ));
                }
                Err(e) => warn!("Accept failed: {}", e),
            },
            _ = shutdown.changed() => break,
        }
    }
    debug!("Accept loop exited");
}

/// Writer task for one viewer. Viewers are passive; anything they send is
/// ignored apart from close frames.
async fn serve_client(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<Registry>,
    mut shutdown: watch::Receiver<bool>,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            debug!("WebSocket handshake with {} failed: {}", peer, e);
            return;
        }
    };
    let (mut write, mut read) = ws.split();

    let (tx, mut rx) = mpsc::channel::<Arc<str>>(registry.queue_capacity());
    let id = registry.register(peer.to_string(), Outbound::Socket(tx));
    info!("Visualization client connected from {}", peer);

    loop {
        tokio::select! {
            queued = rx.recv() => match queued {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text.to_string())).await {
                        debug!("Send to {} failed: {}", peer, e);
                        break;
                    }
                }
                // Removed from the connection set
                None => break,
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!("Read from {} failed: {}", peer, e);
                    break;
                }
                Some(Ok(_)) => {}
            },
            _ = shutdown.changed() => {
                let _ = write.send(Message::Close(None)).await;
                break;
            }
        }
    }

    registry.remove(id);
    info!("Visualization client {} disconnected", peer);
}
