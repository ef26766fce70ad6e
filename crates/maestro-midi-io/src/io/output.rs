//! Hardware/virtual MIDI output ports via midir.

use super::message::MidiOutputMessage;
use super::sink::MidiSink;
use crate::error::{Error, Result};
use midir::{MidiOutput, MidiOutputConnection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

const CLIENT_NAME: &str = "maestro-midi-output";

#[derive(Debug, Clone)]
pub struct MidiOutputDevice {
    pub index: usize,
    pub name: String,
}

/// Which output port a session should open.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortSelection {
    /// First port whose name looks like a software synth, else port 0, else
    /// a virtual port.
    #[default]
    FirstAvailable,
    Index(usize),
    /// Case-insensitive substring match on the port name. Falls back to a
    /// virtual port when nothing matches.
    Named(String),
    /// Create a virtual port other applications can connect to (unix only).
    Virtual(String),
}

pub fn list_output_ports() -> Vec<MidiOutputDevice> {
    let mut devices = Vec::new();
    if let Ok(midi_output) = MidiOutput::new("maestro-device-list") {
        let ports = midi_output.ports();
        for (index, port) in ports.iter().enumerate() {
            let name = midi_output
                .port_name(port)
                .unwrap_or_else(|_| format!("Unknown Device {}", index));
            devices.push(MidiOutputDevice { index, name });
        }
    }
    devices
}

/// A live midir connection.
pub struct MidirSink {
    connection: Option<MidiOutputConnection>,
}

/// Virtual port created when no hardware port can be used.
pub const DEFAULT_VIRTUAL_NAME: &str = "Maestro Generator";

/// Where a [`PortSelection`] lands given the ports present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PortChoice {
    Existing(usize),
    Virtual(String),
    /// Nothing usable; fall back to [`DEFAULT_VIRTUAL_NAME`].
    Fallback(String),
}

pub(crate) fn resolve_port(selection: &PortSelection, names: &[String]) -> Result<PortChoice> {
    match selection {
        PortSelection::Index(i) if *i < names.len() => Ok(PortChoice::Existing(*i)),
        PortSelection::Index(i) => Err(Error::MidiDevice(format!(
            "MIDI output device {} not found ({} available)",
            i,
            names.len()
        ))),
        PortSelection::Named(wanted) => {
            let wanted = wanted.to_lowercase();
            Ok(names
                .iter()
                .position(|n| n.to_lowercase().contains(&wanted))
                .map(PortChoice::Existing)
                .unwrap_or_else(|| {
                    PortChoice::Fallback(format!("no output port matches '{}'", wanted))
                }))
        }
        PortSelection::FirstAvailable => {
            let synth = names.iter().position(|n| {
                let n = n.to_lowercase();
                n.contains("fluid")
                    || n.contains("timidity")
                    || n.contains("microsoft")
                    || n.contains("synth")
            });
            Ok(match synth {
                Some(i) => PortChoice::Existing(i),
                None if !names.is_empty() => PortChoice::Existing(0),
                None => PortChoice::Fallback("no output ports available".to_string()),
            })
        }
        PortSelection::Virtual(name) => Ok(PortChoice::Virtual(name.clone())),
    }
}

impl MidirSink {
    /// Open the port described by `selection`. Returns the sink and the
    /// name of the port actually opened.
    ///
    /// A name that matches nothing, or no ports at all, falls back to a
    /// virtual port called [`DEFAULT_VIRTUAL_NAME`] where the platform
    /// supports one.
    pub fn open(selection: &PortSelection) -> Result<(Self, String)> {
        let midi_output = MidiOutput::new(CLIENT_NAME)?;
        let ports = midi_output.ports();
        let names: Vec<String> = ports
            .iter()
            .enumerate()
            .map(|(i, p)| {
                midi_output
                    .port_name(p)
                    .unwrap_or_else(|_| format!("Device {}", i))
            })
            .collect();

        let index = match resolve_port(selection, &names)? {
            PortChoice::Existing(index) => index,
            PortChoice::Virtual(name) => return Self::open_virtual(midi_output, &name),
            PortChoice::Fallback(reason) => {
                warn!(
                    "{}; creating virtual port '{}'",
                    reason, DEFAULT_VIRTUAL_NAME
                );
                return Self::open_virtual(midi_output, DEFAULT_VIRTUAL_NAME);
            }
        };

        let port = ports.get(index).ok_or_else(|| {
            Error::MidiDevice(format!("MIDI output device {} not found", index))
        })?;
        let name = names[index].clone();

        let connection = midi_output.connect(port, "maestro-output")?;
        info!("Opened MIDI output port {}: {}", index, name);

        Ok((
            Self {
                connection: Some(connection),
            },
            name,
        ))
    }

    #[cfg(unix)]
    fn open_virtual(midi_output: MidiOutput, name: &str) -> Result<(Self, String)> {
        use midir::os::unix::VirtualOutput;

        let connection = midi_output.create_virtual(name)?;
        info!("Created virtual MIDI output port '{}'", name);
        Ok((
            Self {
                connection: Some(connection),
            },
            name.to_string(),
        ))
    }

    #[cfg(not(unix))]
    fn open_virtual(_midi_output: MidiOutput, name: &str) -> Result<(Self, String)> {
        Err(Error::MidiPort(format!(
            "Virtual port '{}' is not supported on this platform",
            name
        )))
    }
}

impl MidiSink for MidirSink {
    fn send(&mut self, message: &MidiOutputMessage) -> Result<()> {
        match self.connection {
            Some(ref mut conn) => Ok(conn.send(&message.bytes)?),
            None => Err(Error::DeviceClosed),
        }
    }

    fn close(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
            debug!("MIDI output connection closed");
        }
    }
}

impl Drop for MidirSink {
    fn drop(&mut self) {
        self.close();
    }
}
