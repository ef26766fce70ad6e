//! # Maestro - Real-time Generative Performance
//!
//! Plays a sequence model's melody over MIDI while hand gestures modulate
//! effect parameters, and streams every note to live viewers.
//!
//! ## Architecture
//!
//! Maestro is an umbrella crate that coordinates:
//! - **maestro-core** - Notes, rolling context window, predictor boundary, sampling
//! - **maestro-midi-io** - Exclusive output device, port selection, CC dedup
//! - **maestro-gesture** - Gesture sources, smoothing, control mapping, producer thread
//! - **maestro-broadcast** - Note event fan-out over WebSocket
//!
//! Three units run concurrently: the melodic loop on the caller's thread
//! (timed by each note's duration), the control producer thread, and the
//! broadcaster's runtime. The output device's lock is the only shared
//! mutable resource.
//!
//! ## Quick Start
//!
//! ```ignore
//! use maestro::prelude::*;
//!
//! let mut session = Orchestrator::builder()
//!     .config(SessionConfig::default())
//!     .predictor(FnPredictor::new(|window, shape| model.forward(window, shape)))
//!     .gesture_source(SimulatedGestureSource::new())
//!     .build()?;
//!
//! let report = session.run()?;
//! println!("{} notes", report.notes_played);
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - `midi-hardware`
//! - `midi-hardware` - Open real/virtual MIDI ports via midir

/// Re-export of maestro-core for direct access
pub use maestro_core as core;

/// Re-export of maestro-midi-io
pub use maestro_midi_io as midi;

/// Re-export of maestro-gesture
pub use maestro_gesture as gesture;

/// Re-export of maestro-broadcast
pub use maestro_broadcast as broadcast;

mod error;
pub use error::{Error, ErrorKind, Result};

mod state;
pub use state::SessionState;

mod config;
pub use config::SessionConfig;

mod builder;
pub use builder::OrchestratorBuilder;

mod orchestrator;
pub use orchestrator::{Orchestrator, SessionReport, Termination};

pub use maestro_core::{StopHandle, StopSignal};

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        Error, ErrorKind, Orchestrator, OrchestratorBuilder, Result, SessionConfig,
        SessionReport, SessionState, StopHandle, Termination,
    };

    pub use maestro_core::{
        note_name, seed, FnPredictor, Note, PredictError, Prediction, Predictor, WindowSnapshot,
    };

    pub use maestro_midi_io::{OutputDevice, RecordingSink};

    #[cfg(feature = "midi-hardware")]
    pub use maestro_midi_io::{list_output_ports, PortSelection};

    pub use maestro_gesture::{
        ControlConfig, ControlMap, ControlStats, GestureLabel, GestureSample, GestureSource,
        ScriptedGestureSource, SimulatedGestureSource,
    };

    pub use maestro_broadcast::{BroadcastConfig, EventBroadcaster, VisualizationEvent};
}
