//! Builder for configuring and constructing an `Orchestrator`.

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::Orchestrator;
use maestro_broadcast::EventBroadcaster;
use maestro_core::{seed, ContextWindow, Note, NoteSampler, Predictor};
use maestro_gesture::GestureSource;
use maestro_midi_io::OutputDevice;
use std::sync::Arc;
use tracing::info;

/// A predictor is required. Everything else falls back to the config:
///
/// - seed: explicit notes, else `seed_file`, else a C-major scale
/// - device: explicit device, else the port in `config.port`
/// - broadcaster: explicit broadcaster, else a WebSocket server on
///   `config.broadcast` when visualization is enabled
/// - gesture source: none unless attached; the control stream only runs
///   with one
///
/// Pure validation runs first, then the broadcaster, then the device, so a
/// configuration error never leaves a port open. The WebSocket server
/// brings its own runtime, so `build` fails with a configuration error when
/// called from async code.
///
/// # Example
///
/// ```ignore
/// use maestro::prelude::*;
///
/// let session = Orchestrator::builder()
///     .config(SessionConfig::from_toml_file("session.toml")?)
///     .predictor(FnPredictor::new(forward))
///     .gesture_source(SimulatedGestureSource::new())
///     .build()?;
/// ```
#[derive(Default)]
pub struct OrchestratorBuilder {
    config: SessionConfig,
    predictor: Option<Box<dyn Predictor>>,
    seed: Option<Vec<Note>>,
    device: Option<OutputDevice>,
    broadcaster: Option<EventBroadcaster>,
    gesture_source: Option<Box<dyn GestureSource>>,
}

impl OrchestratorBuilder {
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn predictor(mut self, predictor: impl Predictor + 'static) -> Self {
        self.predictor = Some(Box::new(predictor));
        self
    }

    /// Initial window contents. Must be exactly `sequence_length` notes.
    pub fn seed(mut self, notes: Vec<Note>) -> Self {
        self.seed = Some(notes);
        self
    }

    pub fn device(mut self, device: OutputDevice) -> Self {
        self.device = Some(device);
        self
    }

    pub fn broadcaster(mut self, broadcaster: EventBroadcaster) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    pub fn gesture_source(mut self, source: impl GestureSource + 'static) -> Self {
        self.gesture_source = Some(Box::new(source));
        self
    }

    pub fn build(self) -> Result<Orchestrator> {
        let config = self.config;
        config.validate()?;

        let predictor = self
            .predictor
            .ok_or_else(|| Error::InvalidConfig("no predictor attached".to_string()))?;

        let seed_notes = match (self.seed, &config.seed_file) {
            (Some(notes), _) => notes,
            (None, Some(path)) => {
                info!("Loading seed from {}", path.display());
                seed::from_json_file(path)?
            }
            (None, None) => seed::c_major(config.sequence_length),
        };
        let window = ContextWindow::seed(&seed_notes, config.sequence_length, config.vocab_size)?;
        let sampler = NoteSampler::new(config.sampler_config())?;

        let broadcaster = match self.broadcaster {
            Some(broadcaster) => broadcaster,
            None if config.visualization_enabled => EventBroadcaster::serve(&config.broadcast)?,
            None => EventBroadcaster::new(),
        };

        let device = match self.device {
            Some(device) => device.with_channel(config.channel),
            None => open_configured_device(&config)?,
        };

        Ok(Orchestrator::from_parts(
            config,
            predictor,
            sampler,
            window,
            Arc::new(device),
            broadcaster,
            self.gesture_source,
        ))
    }
}

#[cfg(feature = "midi-hardware")]
fn open_configured_device(config: &SessionConfig) -> Result<OutputDevice> {
    Ok(OutputDevice::open(&config.port, config.channel)?)
}

#[cfg(not(feature = "midi-hardware"))]
fn open_configured_device(_config: &SessionConfig) -> Result<OutputDevice> {
    Err(Error::InvalidConfig(
        "no output device attached and hardware MIDI is disabled".to_string(),
    ))
}
