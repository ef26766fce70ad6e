//! Note types shared by the generation loop and the context window.

use serde::{Deserialize, Serialize};

/// Size of the pitch vocabulary (MIDI notes 0-127).
pub const VOCAB_SIZE: usize = 128;

/// Highest valid MIDI pitch.
pub const MAX_PITCH: u8 = 127;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// A generated or seeded note.
///
/// `step` is the time between this note's onset and the previous onset,
/// `duration` is how long the note sounds. Both are in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub pitch: u8,
    pub step: f32,
    pub duration: f32,
}

impl Note {
    pub fn new(pitch: u8, step: f32, duration: f32) -> Self {
        Self {
            pitch: pitch.min(MAX_PITCH),
            step,
            duration,
        }
    }

    /// Normalize for model input: pitch is divided by `vocab_size`,
    /// timing values pass through untouched.
    #[inline]
    pub fn normalize(&self, vocab_size: usize) -> NormalizedNote {
        NormalizedNote {
            pitch: self.pitch as f32 / vocab_size as f32,
            step: self.step,
            duration: self.duration,
        }
    }

    /// Scientific pitch name, e.g. `C4` for 60.
    pub fn name(&self) -> String {
        note_name(self.pitch)
    }
}

/// Model-facing representation of a [`Note`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedNote {
    pub pitch: f32,
    pub step: f32,
    pub duration: f32,
}

impl NormalizedNote {
    #[inline]
    pub fn as_array(&self) -> [f32; 3] {
        [self.pitch, self.step, self.duration]
    }
}

/// Convert a MIDI pitch to its name (`C#4`, `A-1`, ...).
///
/// Middle C (60) is `C4`.
pub fn note_name(pitch: u8) -> String {
    let pitch = pitch.min(MAX_PITCH) as i32;
    format!("{}{}", NOTE_NAMES[(pitch % 12) as usize], pitch / 12 - 1)
}
