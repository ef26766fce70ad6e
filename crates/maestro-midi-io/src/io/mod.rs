//! MIDI output I/O: wire messages, sinks and midir ports.

mod message;
mod sink;

#[cfg(feature = "midi-io")]
mod output;

pub use message::{MessageKind, MidiOutputMessage};
pub use sink::{MidiSink, NullSink, RecordingSink};

#[cfg(feature = "midi-io")]
pub use output::{
    list_output_ports, MidiOutputDevice, MidirSink, PortSelection, DEFAULT_VIRTUAL_NAME,
};
