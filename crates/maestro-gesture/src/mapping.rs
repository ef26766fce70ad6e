//! Declarative gesture → control-change mapping.

use crate::error::{Error, Result};
use crate::sample::{GestureLabel, GestureSample};
use crate::smoothing::MovingAverage;
use maestro_midi_io::CcKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const CC_MODULATION: u8 = 1;
pub const CC_RESONANCE: u8 = 71;
pub const CC_FILTER_CUTOFF: u8 = 74;
pub const CC_REVERB: u8 = 91;
pub const CC_CHORUS: u8 = 93;

/// Continuous feature of a [`GestureSample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    PositionX,
    PositionY,
    PinchDistance,
}

impl Axis {
    fn read(self, sample: &GestureSample) -> f32 {
        match self {
            Axis::PositionX => sample.x(),
            Axis::PositionY => sample.y(),
            Axis::PinchDistance => sample.pinch_distance,
        }
    }
}

/// Continuous axis driving one controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisMapping {
    pub axis: Axis,
    pub cc: u8,
    #[serde(default)]
    pub min: f32,
    #[serde(default = "default_max")]
    pub max: f32,
    #[serde(default)]
    pub invert: bool,
    #[serde(default = "default_true")]
    pub smooth: bool,
}

fn default_max() -> f32 {
    1.0
}

fn default_true() -> bool {
    true
}

/// Fixed controller value sent while a label is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEffect {
    pub label: GestureLabel,
    pub cc: u8,
    pub value: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlMap {
    pub axes: Vec<AxisMapping>,
    pub labels: Vec<LabelEffect>,
}

impl Default for ControlMap {
    /// Filter cutoff on X, reverb on inverted Y, resonance on pinch, and
    /// chorus/modulation on poses.
    fn default() -> Self {
        Self {
            axes: vec![
                AxisMapping {
                    axis: Axis::PositionX,
                    cc: CC_FILTER_CUTOFF,
                    min: 0.0,
                    max: 1.0,
                    invert: false,
                    smooth: true,
                },
                AxisMapping {
                    axis: Axis::PositionY,
                    cc: CC_REVERB,
                    min: 0.0,
                    max: 1.0,
                    invert: true,
                    smooth: true,
                },
                AxisMapping {
                    axis: Axis::PinchDistance,
                    cc: CC_RESONANCE,
                    min: 0.0,
                    max: 0.3,
                    invert: false,
                    smooth: true,
                },
            ],
            labels: vec![
                LabelEffect {
                    label: GestureLabel::OpenPalm,
                    cc: CC_CHORUS,
                    value: 127,
                },
                LabelEffect {
                    label: GestureLabel::ClosedFist,
                    cc: CC_CHORUS,
                    value: 0,
                },
                LabelEffect {
                    label: GestureLabel::ClosedFist,
                    cc: CC_MODULATION,
                    value: 0,
                },
                LabelEffect {
                    label: GestureLabel::PeaceSign,
                    cc: CC_MODULATION,
                    value: 64,
                },
                LabelEffect {
                    label: GestureLabel::RockOn,
                    cc: CC_MODULATION,
                    value: 127,
                },
            ],
        }
    }
}

impl ControlMap {
    pub fn validate(&self) -> Result<()> {
        for m in &self.axes {
            if m.cc > 127 {
                return Err(Error::InvalidConfig(format!("CC number {} out of range", m.cc)));
            }
            if !m.min.is_finite() || !m.max.is_finite() || m.max <= m.min {
                return Err(Error::InvalidConfig(format!(
                    "{:?} range [{}, {}] is empty",
                    m.axis, m.min, m.max
                )));
            }
        }
        for e in &self.labels {
            if e.cc > 127 || e.value > 127 {
                return Err(Error::InvalidConfig(format!(
                    "{} effect CC{}={} out of range",
                    e.label, e.cc, e.value
                )));
            }
        }
        Ok(())
    }

    /// Every controller this map can touch.
    pub fn controllers(&self) -> Vec<u8> {
        let mut ccs: Vec<u8> = self
            .axes
            .iter()
            .map(|m| m.cc)
            .chain(self.labels.iter().map(|e| e.cc))
            .collect();
        ccs.sort_unstable();
        ccs.dedup();
        ccs
    }
}

/// `clamp((v - min) / (max - min), 0, 1) * 127`, truncated.
#[inline]
pub fn normalize_to_midi(value: f32, min: f32, max: f32) -> u8 {
    let normalized = ((value - min) / (max - min)).clamp(0.0, 1.0);
    (normalized * 127.0) as u8
}

/// Applies a [`ControlMap`] to samples, holding per-controller smoothing
/// state.
#[derive(Debug)]
pub struct ControlMapper {
    map: ControlMap,
    channel: u8,
    window: usize,
    smoothers: HashMap<CcKey, MovingAverage>,
}

impl ControlMapper {
    pub fn new(map: ControlMap, channel: u8, smoothing_window: usize) -> Self {
        Self {
            map,
            channel: channel.min(15),
            window: smoothing_window,
            smoothers: HashMap::new(),
        }
    }

    pub fn map(&self) -> &ControlMap {
        &self.map
    }

    /// Controller values for one sample, axes first then label effects.
    ///
    /// Non-finite axis readings are dropped without touching smoothing
    /// state.
    pub fn map_sample(&mut self, sample: &GestureSample) -> Vec<(CcKey, u8)> {
        let mut out = Vec::with_capacity(self.map.axes.len() + 2);

        for m in &self.map.axes {
            let raw = m.axis.read(sample);
            if !raw.is_finite() {
                continue;
            }
            let key = CcKey::new(m.cc, self.channel);
            let value = if m.smooth {
                let window = self.window;
                self.smoothers
                    .entry(key)
                    .or_insert_with(|| MovingAverage::new(window))
                    .push(raw)
            } else {
                raw
            };
            let value = if m.invert {
                m.max - (value - m.min)
            } else {
                value
            };
            out.push((key, normalize_to_midi(value, m.min, m.max)));
        }

        for e in self.map.labels.iter().filter(|e| e.label == sample.label) {
            out.push((CcKey::new(e.cc, self.channel), e.value));
        }

        out
    }

    pub fn reset(&mut self) {
        self.smoothers.clear();
    }
}
