//! Exclusive-access MIDI output device.
//!
//! One mutex guards the sink, so every outbound message (notes from the
//! melodic loop, CCs from the control producer, cleanup traffic) is written
//! in a single total order. Sleeping for a note's duration happens outside
//! the lock.

use crate::cc::CcKey;
use crate::error::{Error, Result};
use crate::io::{MidiOutputMessage, MidiSink};
use maestro_core::StopSignal;
use parking_lot::{Condvar, Mutex};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// How a [`OutputDevice::play_note`] call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteOutcome {
    /// Held for the full duration.
    Completed,
    /// Stop was requested mid-note. The note-off was still sent.
    Interrupted,
}

pub struct OutputDevice {
    sink: Mutex<Option<Box<dyn MidiSink>>>,
    name: String,
    channel: u8,
    sounding: Mutex<[bool; 128]>,
    pitch_released: Condvar,
    sent_ccs: Mutex<BTreeSet<CcKey>>,
    messages_sent: AtomicU64,
}

/// Releases a held pitch on drop, including on error paths.
struct PitchGuard<'a> {
    device: &'a OutputDevice,
    pitch: u8,
}

impl Drop for PitchGuard<'_> {
    fn drop(&mut self) {
        self.device.sounding.lock()[self.pitch as usize] = false;
        self.device.pitch_released.notify_all();
    }
}

impl OutputDevice {
    /// Wrap a custom sink. Notes go out on channel 0 unless
    /// [`with_channel`](Self::with_channel) says otherwise.
    pub fn new(sink: Box<dyn MidiSink>) -> Self {
        Self {
            sink: Mutex::new(Some(sink)),
            name: "custom".to_string(),
            channel: 0,
            sounding: Mutex::new([false; 128]),
            pitch_released: Condvar::new(),
            sent_ccs: Mutex::new(BTreeSet::new()),
            messages_sent: AtomicU64::new(0),
        }
    }

    /// Open a midir output port.
    #[cfg(feature = "midi-io")]
    pub fn open(selection: &crate::io::PortSelection, channel: u8) -> Result<Self> {
        let (sink, name) = crate::io::MidirSink::open(selection)?;
        Ok(Self::new(Box::new(sink))
            .with_name(name)
            .with_channel(channel))
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel.min(15);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Channel used for notes.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn is_closed(&self) -> bool {
        self.sink.lock().is_none()
    }

    /// Messages successfully written since the device was created.
    pub fn messages_sent(&self) -> u64 {
        self.messages_sent.load(Ordering::Relaxed)
    }

    /// Every `(cc, channel)` successfully sent through [`send_cc`](Self::send_cc).
    pub fn sent_cc_keys(&self) -> Vec<CcKey> {
        self.sent_ccs.lock().iter().copied().collect()
    }

    fn send(&self, message: &MidiOutputMessage) -> Result<()> {
        let mut sink = self.sink.lock();
        match sink.as_mut() {
            Some(sink) => {
                sink.send(message)?;
                self.messages_sent.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            None => Err(Error::DeviceClosed),
        }
    }

    fn hold_pitch(&self, pitch: u8) -> PitchGuard<'_> {
        let mut sounding = self.sounding.lock();
        while sounding[pitch as usize] {
            self.pitch_released.wait(&mut sounding);
        }
        sounding[pitch as usize] = true;
        PitchGuard {
            device: self,
            pitch,
        }
    }

    /// Sound one note and block for `duration`.
    ///
    /// Waits first if the same pitch is already sounding from another
    /// caller, so a note-on is always paired with its own note-off. The
    /// sleep ends early when `stop` fires; the note-off is sent either way.
    pub fn play_note(
        &self,
        pitch: u8,
        duration: Duration,
        velocity: u8,
        stop: &StopSignal,
    ) -> Result<NoteOutcome> {
        let pitch = pitch.min(127);
        let velocity = velocity.min(127);
        let _held = self.hold_pitch(pitch);

        self.send(&MidiOutputMessage::note_on(self.channel, pitch, velocity))?;

        let interrupted = stop.wait_timeout(duration);

        self.send(&MidiOutputMessage::note_off(self.channel, pitch, 0))?;

        if interrupted {
            debug!("Note {} interrupted by stop", pitch);
            Ok(NoteOutcome::Interrupted)
        } else {
            Ok(NoteOutcome::Completed)
        }
    }

    /// Send one control change immediately.
    pub fn send_cc(&self, cc: u8, value: u8, channel: u8) -> Result<()> {
        let key = CcKey::new(cc, channel);
        self.send(&MidiOutputMessage::control_change(
            key.channel,
            key.cc,
            value.min(127),
        ))?;
        self.sent_ccs.lock().insert(key);
        Ok(())
    }

    /// Note-off for all 128 pitches on the note channel.
    pub fn all_notes_off(&self) -> Result<()> {
        let messages = (0..=127u8).map(|p| MidiOutputMessage::note_off(self.channel, p, 0));
        self.send_all(messages, "all-notes-off")
    }

    /// Set every given controller back to 0.
    pub fn reset_ccs(&self, keys: impl IntoIterator<Item = CcKey>) -> Result<()> {
        let messages = keys
            .into_iter()
            .map(|k| MidiOutputMessage::control_change(k.channel, k.cc, 0));
        self.send_all(messages, "cc reset")
    }

    /// Reset every controller sent so far this session.
    pub fn reset_sent_ccs(&self) -> Result<()> {
        let keys = self.sent_cc_keys();
        self.reset_ccs(keys)
    }

    fn send_all(
        &self,
        messages: impl Iterator<Item = MidiOutputMessage>,
        what: &str,
    ) -> Result<()> {
        let mut attempted = 0;
        let mut failed = 0;
        for message in messages {
            attempted += 1;
            if let Err(e) = self.send(&message) {
                failed += 1;
                debug!("{} send failed: {}", what, e);
            }
        }

        if failed > 0 {
            warn!("{}: {} of {} messages failed", what, failed, attempted);
            return Err(Error::PartialCleanup { failed, attempted });
        }
        Ok(())
    }

    /// Release the port. Later sends fail with [`Error::DeviceClosed`].
    pub fn close(&self) {
        if let Some(mut sink) = self.sink.lock().take() {
            sink.close();
            info!(
                "MIDI output '{}' closed after {} messages",
                self.name,
                self.messages_sent()
            );
        }
    }
}

impl std::fmt::Debug for OutputDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputDevice")
            .field("name", &self.name)
            .field("channel", &self.channel)
            .field("closed", &self.is_closed())
            .finish()
    }
}
