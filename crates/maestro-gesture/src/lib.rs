//! Gesture-driven control stream for maestro.
//!
//! A [`GestureSource`] yields hand samples; a [`ControlStreamProducer`] maps
//! them through a declarative [`ControlMap`] (with per-controller
//! [`MovingAverage`] smoothing and dedup) and sends control changes through
//! the shared [`OutputDevice`](maestro_midi_io::OutputDevice).
//!
//! Hand-landmark detection and pose classification live outside this crate;
//! [`SimulatedGestureSource`] and [`ScriptedGestureSource`] stand in for a
//! camera.

pub mod error;
pub use error::{Error, Result};

mod sample;
pub use sample::{GestureLabel, GestureSample};

mod smoothing;
pub use smoothing::MovingAverage;

pub mod mapping;
pub use mapping::{Axis, AxisMapping, ControlMap, ControlMapper, LabelEffect};

mod source;
pub use source::{GestureSource, ScriptedFrame, ScriptedGestureSource, SimulatedGestureSource};

mod producer;
pub use producer::{ControlConfig, ControlStats, ControlStreamProducer};
