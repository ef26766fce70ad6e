//! Session configuration.
//!
//! Every field has a default, so a TOML file only needs the values it
//! changes:
//!
//! ```toml
//! temperature = 1.5
//! speed = 2.0
//! num_notes = 64
//!
//! [control]
//! rate_hz = 30.0
//!
//! [broadcast]
//! bind_addr = "127.0.0.1:8765"
//! ```

use crate::error::{Error, Result};
use maestro_broadcast::BroadcastConfig;
use maestro_core::{SamplerConfig, VOCAB_SIZE};
use maestro_gesture::ControlConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[cfg(feature = "midi-hardware")]
use maestro_midi_io::PortSelection;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Sampling temperature; higher is more adventurous.
    pub temperature: f32,
    pub velocity: u8,
    /// Seconds. Sampled durations are clamped to `[min, max]`.
    pub min_duration: f32,
    pub max_duration: f32,
    /// Playback multiplier on step and duration. `2.0` plays twice as slow.
    pub speed: f32,
    /// Stop after this many notes. `None` runs until stopped.
    pub num_notes: Option<u64>,
    pub sequence_length: usize,
    pub vocab_size: usize,
    /// Note channel (0-15).
    pub channel: u8,
    /// Seconds to wait after starting the control stream before the first
    /// note.
    pub settling_delay: f32,
    /// Seconds to wait for the control thread at shutdown.
    pub producer_join_timeout: f32,
    pub random_seed: Option<u64>,
    /// JSON seed notes. When unset, a C-major scale is used.
    pub seed_file: Option<PathBuf>,
    pub gesture_enabled: bool,
    pub visualization_enabled: bool,

    #[cfg(feature = "midi-hardware")]
    pub port: PortSelection,

    pub control: ControlConfig,
    pub broadcast: BroadcastConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            temperature: 2.0,
            velocity: 80,
            min_duration: 0.1,
            max_duration: 2.0,
            speed: 1.0,
            num_notes: None,
            sequence_length: 25,
            vocab_size: VOCAB_SIZE,
            channel: 0,
            settling_delay: 3.0,
            producer_join_timeout: 2.0,
            random_seed: None,
            seed_file: None,
            gesture_enabled: true,
            visualization_enabled: true,
            #[cfg(feature = "midi-hardware")]
            port: PortSelection::default(),
            control: ControlConfig::default(),
            broadcast: BroadcastConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn sampler_config(&self) -> SamplerConfig {
        SamplerConfig {
            temperature: self.temperature,
            min_duration: self.min_duration,
            max_duration: self.max_duration,
            seed: self.random_seed,
        }
    }

    pub fn settling_delay(&self) -> Duration {
        secs_or_max(self.settling_delay)
    }

    pub fn producer_join_timeout(&self) -> Duration {
        secs_or_max(self.producer_join_timeout)
    }

    pub fn validate(&self) -> Result<()> {
        self.sampler_config().validate()?;

        if !self.speed.is_finite() || self.speed <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "speed must be positive, got {}",
                self.speed
            )));
        }
        if Duration::try_from_secs_f32(self.max_duration * self.speed).is_err() {
            return Err(Error::InvalidConfig(format!(
                "max_duration {} at speed {} overflows",
                self.max_duration, self.speed
            )));
        }
        if self.velocity > 127 {
            return Err(Error::InvalidConfig(format!(
                "velocity {} out of range 0-127",
                self.velocity
            )));
        }
        if self.sequence_length == 0 {
            return Err(Error::InvalidConfig(
                "sequence_length must be at least 1".to_string(),
            ));
        }
        if self.vocab_size == 0 {
            return Err(Error::InvalidConfig("vocab_size must be at least 1".to_string()));
        }
        if self.channel > 15 {
            return Err(Error::InvalidConfig(format!(
                "channel {} out of range 0-15",
                self.channel
            )));
        }
        for (name, secs) in [
            ("settling_delay", self.settling_delay),
            ("producer_join_timeout", self.producer_join_timeout),
        ] {
            if Duration::try_from_secs_f32(secs).is_err() {
                return Err(Error::InvalidConfig(format!(
                    "{} must be a non-negative number of seconds, got {}",
                    name, secs
                )));
            }
        }

        self.control.validate()?;
        Ok(())
    }
}

/// Validated configs never hit the saturating branch.
fn secs_or_max(secs: f32) -> Duration {
    Duration::try_from_secs_f32(secs).unwrap_or(Duration::MAX)
}
