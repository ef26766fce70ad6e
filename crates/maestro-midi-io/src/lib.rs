//! MIDI output subsystem for maestro.
//!
//! Provides the exclusive-access [`OutputDevice`], port selection over midir,
//! control-change dedup and MIDI-learn sweeps.
//!
//! Feature gates: `midi-io` (hardware ports via midir). Without it, only
//! custom [`MidiSink`]s such as [`RecordingSink`] are available.

pub mod error;
pub use error::{Error, Result};

pub(crate) mod io;
pub use io::{MessageKind, MidiOutputMessage, MidiSink, NullSink, RecordingSink};

#[cfg(feature = "midi-io")]
pub use io::{
    list_output_ports, MidiOutputDevice, MidirSink, PortSelection, DEFAULT_VIRTUAL_NAME,
};

mod device;
pub use device::{NoteOutcome, OutputDevice};

pub mod cc;
pub use cc::{CcDeduplicator, CcKey, CcNumber, MidiChannel};
