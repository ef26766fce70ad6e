//! Note events as seen by viewers.

use chrono::{DateTime, Utc};
use maestro_core::{note_name, Note};
use serde::{Deserialize, Serialize};

/// One performed note. Serializes to
/// `{"type":"note","pitch",...,"noteName","timestamp","index"}`.
///
/// `step` and `duration` are the values actually played, after speed
/// scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "note", rename_all = "camelCase")]
pub struct VisualizationEvent {
    pub pitch: u8,
    pub step: f32,
    pub duration: f32,
    pub velocity: u8,
    pub note_name: String,
    pub timestamp: DateTime<Utc>,
    pub index: u64,
}

impl VisualizationEvent {
    /// Event for `note` stamped with the current time.
    pub fn new(note: &Note, velocity: u8, index: u64) -> Self {
        Self::at(note, velocity, index, Utc::now())
    }

    pub fn at(note: &Note, velocity: u8, index: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            pitch: note.pitch,
            step: note.step,
            duration: note.duration,
            velocity: velocity.min(127),
            note_name: note_name(note.pitch),
            timestamp,
            index,
        }
    }
}
