//! MIDI 1.0 channel-voice message encoding.

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;
const CONTROL_CHANGE: u8 = 0xB0;

/// One outbound wire message: status byte plus data bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiOutputMessage {
    pub bytes: Vec<u8>,
}

/// Decoded view of a [`MidiOutputMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, cc: u8, value: u8 },
    Other,
}

impl MidiOutputMessage {
    pub fn control_change(channel: u8, cc_number: u8, value: u8) -> Self {
        let channel = channel.min(15); // MIDI channels are 0-15
        Self {
            bytes: vec![CONTROL_CHANGE | channel, cc_number & 0x7F, value & 0x7F],
        }
    }

    pub fn note_on(channel: u8, note: u8, velocity: u8) -> Self {
        let channel = channel.min(15);
        Self {
            bytes: vec![NOTE_ON | channel, note & 0x7F, velocity & 0x7F],
        }
    }

    pub fn note_off(channel: u8, note: u8, velocity: u8) -> Self {
        let channel = channel.min(15);
        Self {
            bytes: vec![NOTE_OFF | channel, note & 0x7F, velocity & 0x7F],
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self.bytes.as_slice() {
            &[status, a, b] => {
                let channel = status & 0x0F;
                match status & 0xF0 {
                    NOTE_ON => MessageKind::NoteOn {
                        channel,
                        note: a,
                        velocity: b,
                    },
                    NOTE_OFF => MessageKind::NoteOff {
                        channel,
                        note: a,
                        velocity: b,
                    },
                    CONTROL_CHANGE => MessageKind::ControlChange {
                        channel,
                        cc: a,
                        value: b,
                    },
                    _ => MessageKind::Other,
                }
            }
            _ => MessageKind::Other,
        }
    }

    #[inline]
    pub fn is_note_off(&self) -> bool {
        matches!(self.kind(), MessageKind::NoteOff { .. })
    }

    #[inline]
    pub fn is_control_change(&self) -> bool {
        matches!(self.kind(), MessageKind::ControlChange { .. })
    }
}
