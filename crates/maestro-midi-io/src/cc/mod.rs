//! Control-change bookkeeping: dedup state and MIDI-learn sweeps.

mod dedup;
mod sweep;

pub use dedup::{CcDeduplicator, DEFAULT_DEDUP_THRESHOLD};
pub use sweep::{sweep, SweepConfig, SweepOutcome};

use serde::{Deserialize, Serialize};

/// MIDI channel (0-15).
pub type MidiChannel = u8;

/// CC number (0-127).
pub type CcNumber = u8;

/// Identity of a controller on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CcKey {
    pub cc: CcNumber,
    pub channel: MidiChannel,
}

impl CcKey {
    pub fn new(cc: CcNumber, channel: MidiChannel) -> Self {
        Self {
            cc: cc.min(127),
            channel: channel.min(15),
        }
    }
}

impl std::fmt::Display for CcKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CC{}@ch{}", self.cc, self.channel)
    }
}
