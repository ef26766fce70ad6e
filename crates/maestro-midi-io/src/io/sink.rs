//! Byte sinks behind the [`OutputDevice`](crate::OutputDevice).

use super::message::{MessageKind, MidiOutputMessage};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Destination for raw MIDI bytes.
///
/// Owned by exactly one [`OutputDevice`](crate::OutputDevice), which
/// serializes every call behind its lock.
pub trait MidiSink: Send {
    fn send(&mut self, message: &MidiOutputMessage) -> Result<()>;

    /// Release the underlying port. Called once when the device closes.
    fn close(&mut self) {}
}

/// Discards everything. Used when no port is wanted (dry runs).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl MidiSink for NullSink {
    fn send(&mut self, _message: &MidiOutputMessage) -> Result<()> {
        Ok(())
    }
}

type FailPredicate = Arc<dyn Fn(&MidiOutputMessage) -> bool + Send + Sync>;

/// In-memory sink that keeps every delivered message.
///
/// Clones share the same log, so a test can keep one clone and hand the
/// other to the device.
#[derive(Clone, Default)]
pub struct RecordingSink {
    log: Arc<Mutex<Vec<MidiOutputMessage>>>,
    attempts: Arc<AtomicUsize>,
    closed: Arc<Mutex<bool>>,
    fail_when: Option<FailPredicate>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject (and don't record) every message matching `predicate`.
    pub fn fail_when(
        mut self,
        predicate: impl Fn(&MidiOutputMessage) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.fail_when = Some(Arc::new(predicate));
        self
    }

    /// Messages successfully delivered, in wire order.
    pub fn messages(&self) -> Vec<MidiOutputMessage> {
        self.log.lock().clone()
    }

    pub fn kinds(&self) -> Vec<MessageKind> {
        self.log.lock().iter().map(|m| m.kind()).collect()
    }

    /// `(channel, cc, value)` for every delivered control change.
    pub fn control_changes(&self) -> Vec<(u8, u8, u8)> {
        self.log
            .lock()
            .iter()
            .filter_map(|m| match m.kind() {
                MessageKind::ControlChange { channel, cc, value } => Some((channel, cc, value)),
                _ => None,
            })
            .collect()
    }

    /// Pitches of every delivered note-off.
    pub fn note_offs(&self) -> Vec<u8> {
        self.log
            .lock()
            .iter()
            .filter_map(|m| match m.kind() {
                MessageKind::NoteOff { note, .. } => Some(note),
                _ => None,
            })
            .collect()
    }

    /// Total `send` calls, including rejected ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock()
    }

    pub fn clear(&self) {
        self.log.lock().clear();
        self.attempts.store(0, Ordering::Relaxed);
    }
}

impl MidiSink for RecordingSink {
    fn send(&mut self, message: &MidiOutputMessage) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if let Some(ref fail) = self.fail_when {
            if fail(message) {
                return Err(Error::Send(format!("rejected {:02X?}", message.bytes)));
            }
        }
        self.log.lock().push(message.clone());
        Ok(())
    }

    fn close(&mut self) {
        *self.closed.lock() = true;
    }
}

impl std::fmt::Debug for RecordingSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSink")
            .field("messages", &self.log.lock().len())
            .field("attempts", &self.attempts())
            .finish()
    }
}
