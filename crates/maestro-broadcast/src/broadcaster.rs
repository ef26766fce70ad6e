//! Connection set and fan-out.
//!
//! `broadcast` never blocks: it serializes once and pushes the shared text
//! onto every client's bounded queue. Socket writes happen on each client's
//! own writer task. A viewer whose queue is full misses that event.

use crate::error::{Error, Result};
use crate::event::VisualizationEvent;
use crate::server::{self, BroadcastConfig, ServerHandle, DEFAULT_CLIENT_QUEUE};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, TryRecvError, TrySendError};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

pub type ClientId = u64;

/// Where a client's messages go.
#[derive(Debug)]
pub(crate) enum Outbound {
    /// Writer task of a WebSocket connection.
    Socket(mpsc::Sender<Arc<str>>),
    /// In-process [`Subscription`].
    Local(crossbeam_channel::Sender<Arc<str>>),
}

enum Enqueued {
    Queued,
    Full,
    Closed,
}

impl Outbound {
    fn enqueue(&self, text: Arc<str>) -> Enqueued {
        match self {
            Outbound::Socket(tx) => match tx.try_send(text) {
                Ok(()) => Enqueued::Queued,
                Err(mpsc::error::TrySendError::Full(_)) => Enqueued::Full,
                Err(mpsc::error::TrySendError::Closed(_)) => Enqueued::Closed,
            },
            Outbound::Local(tx) => match tx.try_send(text) {
                Ok(()) => Enqueued::Queued,
                Err(TrySendError::Full(_)) => Enqueued::Full,
                Err(TrySendError::Disconnected(_)) => Enqueued::Closed,
            },
        }
    }
}

/// Membership entry in the connection set.
#[derive(Debug)]
pub struct ClientConnection {
    pub id: ClientId,
    /// Peer address, or `"local"` for in-process viewers.
    pub peer: String,
    outbound: Outbound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastOutcome {
    /// No clients; nothing was serialized.
    Skipped,
    /// `lagged` viewers had a full queue and missed this event; `dropped`
    /// viewers were gone and have been removed.
    Delivered {
        queued: usize,
        lagged: usize,
        dropped: usize,
    },
    /// The event could not be serialized.
    Failed,
}

#[derive(Debug)]
pub(crate) struct Registry {
    clients: DashMap<ClientId, ClientConnection>,
    next_id: AtomicU64,
    events: AtomicU64,
    queue_capacity: usize,
}

impl Registry {
    pub(crate) fn new(queue_capacity: usize) -> Self {
        Self {
            clients: DashMap::new(),
            next_id: AtomicU64::new(0),
            events: AtomicU64::new(0),
            queue_capacity: queue_capacity.max(1),
        }
    }

    pub(crate) fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    pub(crate) fn register(&self, peer: String, outbound: Outbound) -> ClientId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!("Viewer {} connected ({})", id, peer);
        self.clients.insert(id, ClientConnection { id, peer, outbound });
        id
    }

    pub(crate) fn remove(&self, id: ClientId) {
        if let Some((_, client)) = self.clients.remove(&id) {
            debug!("Viewer {} disconnected ({})", id, client.peer);
        }
    }

    pub(crate) fn clear(&self) {
        self.clients.clear();
    }
}

/// Fans note events out to connected viewers.
pub struct EventBroadcaster {
    registry: Arc<Registry>,
    server: Mutex<Option<ServerHandle>>,
}

impl EventBroadcaster {
    /// In-process broadcaster with no network listener. Viewers attach with
    /// [`subscribe`](Self::subscribe).
    pub fn new() -> Self {
        Self::with_queue_capacity(DEFAULT_CLIENT_QUEUE)
    }

    /// In-process broadcaster whose viewers each buffer at most `capacity`
    /// unread events.
    pub fn with_queue_capacity(capacity: usize) -> Self {
        Self {
            registry: Arc::new(Registry::new(capacity)),
            server: Mutex::new(None),
        }
    }

    /// Start a WebSocket server on `config.bind_addr`.
    ///
    /// Must be called outside any tokio runtime; the server runs on its
    /// own.
    pub fn serve(config: &BroadcastConfig) -> Result<Self> {
        let broadcaster = Self::with_queue_capacity(config.client_queue);
        let handle = server::start(config, Arc::clone(&broadcaster.registry))?;
        info!("Visualization server listening on ws://{}", handle.local_addr());
        *broadcaster.server.lock() = Some(handle);
        Ok(broadcaster)
    }

    /// Address the WebSocket server is bound to, if serving.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.lock().as_ref().map(|s| s.local_addr())
    }

    pub fn client_count(&self) -> usize {
        self.registry.clients.len()
    }

    pub fn clients(&self) -> Vec<(ClientId, String)> {
        self.registry
            .clients
            .iter()
            .map(|c| (c.id, c.peer.clone()))
            .collect()
    }

    /// Events that reached at least one client.
    pub fn events_broadcast(&self) -> u64 {
        self.registry.events.load(Ordering::Relaxed)
    }

    /// Attach an in-process viewer.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = bounded(self.registry.queue_capacity());
        let id = self
            .registry
            .register("local".to_string(), Outbound::Local(tx));
        Subscription {
            id,
            rx,
            registry: Arc::clone(&self.registry),
        }
    }

    pub fn broadcast(&self, event: &VisualizationEvent) -> BroadcastOutcome {
        if self.registry.clients.is_empty() {
            return BroadcastOutcome::Skipped;
        }

        let text: Arc<str> = match serde_json::to_string(event) {
            Ok(text) => text.into(),
            Err(e) => {
                debug!("Failed to serialize event {}: {}", event.index, e);
                return BroadcastOutcome::Failed;
            }
        };

        let mut queued = 0;
        let mut lagged = 0;
        let mut gone = Vec::new();
        for client in self.registry.clients.iter() {
            match client.outbound.enqueue(Arc::clone(&text)) {
                Enqueued::Queued => queued += 1,
                Enqueued::Full => {
                    lagged += 1;
                    debug!("Viewer {} is behind, event {} skipped", client.id, event.index);
                }
                Enqueued::Closed => gone.push(client.id),
            }
        }

        // Removal can't happen while iterating the map.
        let dropped = gone.len();
        for id in gone {
            self.registry.remove(id);
        }

        if queued > 0 {
            self.registry.events.fetch_add(1, Ordering::Relaxed);
        }
        BroadcastOutcome::Delivered {
            queued,
            lagged,
            dropped,
        }
    }

    /// Stop accepting connections and drop every client. Idempotent.
    pub fn shutdown(&self) {
        let server = self.server.lock().take();
        self.registry.clear();
        if let Some(server) = server {
            server.shutdown();
            info!("Visualization server stopped");
        }
    }

    pub fn is_serving(&self) -> bool {
        self.server.lock().is_some()
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventBroadcaster {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// In-process viewer. Unregisters itself on drop.
#[derive(Debug)]
pub struct Subscription {
    id: ClientId,
    rx: Receiver<Arc<str>>,
    registry: Arc<Registry>,
}

impl Subscription {
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Next raw JSON message, waiting up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<Arc<str>>> {
        match self.rx.recv_timeout(timeout) {
            Ok(text) => Ok(Some(text)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(Error::Shutdown),
        }
    }

    /// Next event, parsed, waiting up to `timeout`.
    pub fn next_event(&self, timeout: Duration) -> Result<Option<VisualizationEvent>> {
        match self.recv_timeout(timeout)? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Every message queued right now.
    pub fn drain(&self) -> Vec<Arc<str>> {
        let mut out = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(text) => out.push(text),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        out
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maestro_core::Note;

    fn event(index: u64) -> VisualizationEvent {
        VisualizationEvent::new(&Note::new(60, 0.5, 0.4), 80, index)
    }

    #[test]
    fn test_no_clients_skips() {
        let broadcaster = EventBroadcaster::new();
        assert_eq!(broadcaster.broadcast(&event(0)), BroadcastOutcome::Skipped);
        assert_eq!(broadcaster.events_broadcast(), 0);
    }

    #[test]
    fn test_fan_out_to_subscribers() {
        let broadcaster = EventBroadcaster::new();
        let a = broadcaster.subscribe();
        let b = broadcaster.subscribe();

        let outcome = broadcaster.broadcast(&event(7));
        assert_eq!(
            outcome,
            BroadcastOutcome::Delivered {
                queued: 2,
                lagged: 0,
                dropped: 0
            }
        );

        let from_a = a.recv_timeout(Duration::from_secs(1)).unwrap().unwrap();
        let from_b = b.recv_timeout(Duration::from_secs(1)).unwrap().unwrap();
        // Serialized once, shared
        assert!(Arc::ptr_eq(&from_a, &from_b));
        assert_eq!(
            a.next_event(Duration::ZERO).unwrap(),
            None
        );
    }

    #[test]
    fn test_dead_client_removed_others_unaffected() {
        let broadcaster = EventBroadcaster::new();
        let alive = broadcaster.subscribe();

        // Register a client whose receiving side is already gone
        let (tx, rx) = bounded(4);
        drop(rx);
        broadcaster
            .registry
            .register("dead".to_string(), Outbound::Local(tx));
        assert_eq!(broadcaster.client_count(), 2);

        let outcome = broadcaster.broadcast(&event(1));
        assert_eq!(
            outcome,
            BroadcastOutcome::Delivered {
                queued: 1,
                lagged: 0,
                dropped: 1
            }
        );
        assert_eq!(broadcaster.client_count(), 1);

        let received = alive.next_event(Duration::from_secs(1)).unwrap().unwrap();
        assert_eq!(received.index, 1);
    }

    #[test]
    fn test_full_queue_skips_event_for_that_viewer() {
        let broadcaster = EventBroadcaster::with_queue_capacity(2);
        let stalled = broadcaster.subscribe();
        let reader = broadcaster.subscribe();

        for index in 0..2 {
            broadcaster.broadcast(&event(index));
            reader.next_event(Duration::from_secs(1)).unwrap().unwrap();
        }

        let outcome = broadcaster.broadcast(&event(2));
        assert_eq!(
            outcome,
            BroadcastOutcome::Delivered {
                queued: 1,
                lagged: 1,
                dropped: 0
            }
        );
        assert_eq!(broadcaster.client_count(), 2);

        // The stalled viewer keeps its backlog and picks up again once drained
        assert_eq!(stalled.drain().len(), 2);
        broadcaster.broadcast(&event(3));
        assert_eq!(
            stalled.next_event(Duration::from_secs(1)).unwrap().unwrap().index,
            3
        );
        assert_eq!(
            reader.next_event(Duration::from_secs(1)).unwrap().unwrap().index,
            2
        );
    }

    #[test]
    fn test_subscription_drop_unregisters() {
        let broadcaster = EventBroadcaster::new();
        {
            let _sub = broadcaster.subscribe();
            assert_eq!(broadcaster.client_count(), 1);
        }
        assert_eq!(broadcaster.client_count(), 0);
        assert_eq!(broadcaster.broadcast(&event(0)), BroadcastOutcome::Skipped);
    }

    #[test]
    fn test_shutdown_disconnects_subscribers() {
        let broadcaster = EventBroadcaster::new();
        let sub = broadcaster.subscribe();
        broadcaster.shutdown();
        broadcaster.shutdown();

        assert_eq!(broadcaster.client_count(), 0);
        assert!(matches!(
            sub.recv_timeout(Duration::from_millis(10)),
            Err(Error::Shutdown)
        ));
    }
}
