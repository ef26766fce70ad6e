//! Rolling note history fed to the predictor.
//!
//! The window is a fixed-size circular buffer: `append` overwrites the oldest
//! slot and advances the head, so the length never changes after seeding.
//! `snapshot` reconstructs the contiguous oldest-first view the model expects.

use crate::error::{Error, Result};
use crate::note::{NormalizedNote, Note};
use std::sync::Arc;

/// Fixed-length FIFO of normalized notes.
#[derive(Debug, Clone)]
pub struct ContextWindow {
    slots: Vec<NormalizedNote>,
    /// Index of the oldest note (next slot to overwrite).
    head: usize,
    vocab_size: usize,
}

impl ContextWindow {
    /// Build a window from a seed of exactly `sequence_length` notes.
    pub fn seed(notes: &[Note], sequence_length: usize, vocab_size: usize) -> Result<Self> {
        if sequence_length == 0 || notes.len() != sequence_length {
            return Err(Error::InvalidSeed {
                expected: sequence_length,
                actual: notes.len(),
            });
        }

        let slots = notes.iter().map(|n| n.normalize(vocab_size)).collect();
        Ok(Self {
            slots,
            head: 0,
            vocab_size,
        })
    }

    /// Push the newest note and drop the oldest.
    #[inline]
    pub fn append(&mut self, note: &Note) {
        self.slots[self.head] = note.normalize(self.vocab_size);
        self.head = (self.head + 1) % self.slots.len();
    }

    /// Immutable oldest-first copy for inference.
    pub fn snapshot(&self) -> WindowSnapshot {
        let mut contiguous = Vec::with_capacity(self.slots.len());
        contiguous.extend_from_slice(&self.slots[self.head..]);
        contiguous.extend_from_slice(&self.slots[..self.head]);
        WindowSnapshot {
            notes: Arc::from(contiguous),
        }
    }

    /// Most recently appended note.
    pub fn newest(&self) -> NormalizedNote {
        let idx = (self.head + self.slots.len() - 1) % self.slots.len();
        self.slots[idx]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn sequence_length(&self) -> usize {
        self.slots.len()
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab_size
    }
}

/// Read-only view of a [`ContextWindow`] at one point in time.
///
/// Cloning is an `Arc` increment.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot {
    notes: Arc<[NormalizedNote]>,
}

impl WindowSnapshot {
    pub fn notes(&self) -> &[NormalizedNote] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Flat `[len, 3]` row-major tensor data (`pitch, step, duration` per row).
    pub fn as_flat(&self) -> Vec<f32> {
        self.notes.iter().flat_map(|n| n.as_array()).collect()
    }

    /// Tensor shape for [`as_flat`](Self::as_flat).
    pub fn shape(&self) -> [usize; 2] {
        [self.notes.len(), 3]
    }
}
