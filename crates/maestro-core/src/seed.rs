//! Seed sequences for priming the context window.

use crate::error::Result;
use crate::note::Note;
use std::path::Path;

const C_MAJOR_OFFSETS: [u8; 8] = [0, 2, 4, 5, 7, 9, 11, 12];

/// Ascending C-major scale from middle C, repeated to `len` notes.
///
/// Every note has `step = 0.5` and `duration = 0.4`.
pub fn c_major(len: usize) -> Vec<Note> {
    (0..len)
        .map(|i| Note::new(60 + C_MAJOR_OFFSETS[i % C_MAJOR_OFFSETS.len()], 0.5, 0.4))
        .collect()
}

/// `len` copies of the same note.
pub fn constant(note: Note, len: usize) -> Vec<Note> {
    vec![note; len]
}

/// Parse a seed from a JSON array.
///
/// Accepts either objects (`{"pitch": 60, "step": 0.5, "duration": 0.4}`) or
/// `[pitch, step, duration]` triples.
pub fn from_json_str(json: &str) -> Result<Vec<Note>> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Row {
        Note(Note),
        Triple(f32, f32, f32),
    }

    let rows: Vec<Row> = serde_json::from_str(json)?;
    Ok(rows
        .into_iter()
        .map(|row| match row {
            Row::Note(n) => Note::new(n.pitch, n.step, n.duration),
            Row::Triple(p, s, d) => Note::new(p.clamp(0.0, 127.0) as u8, s, d),
        })
        .collect())
}

pub fn from_json_file(path: impl AsRef<Path>) -> Result<Vec<Note>> {
    let text = std::fs::read_to_string(path)?;
    from_json_str(&text)
}
