//! Turns raw predictor output into a valid [`Note`].

use crate::error::{Error, Result};
use crate::note::{Note, VOCAB_SIZE};
use crate::predictor::Prediction;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerConfig {
    pub temperature: f32,
    /// Shortest note the sampler will emit, in seconds.
    pub min_duration: f32,
    /// Longest note the sampler will emit, in seconds.
    pub max_duration: f32,
    /// Fixed RNG seed for reproducible sessions.
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            temperature: 2.0,
            min_duration: 0.1,
            max_duration: 2.0,
            seed: None,
        }
    }
}

impl SamplerConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(Error::InvalidTemperature(self.temperature));
        }
        if self.min_duration.is_nan()
            || self.min_duration <= 0.0
            || !self.max_duration.is_finite()
            || self.min_duration > self.max_duration
        {
            return Err(Error::InvalidDurationRange {
                min: self.min_duration,
                max: self.max_duration,
            });
        }
        Ok(())
    }
}

/// Temperature-scaled categorical pitch sampling plus timing clamps.
pub struct NoteSampler {
    config: SamplerConfig,
    rng: StdRng,
}

impl NoteSampler {
    pub fn new(config: SamplerConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Draw a note from a prediction.
    ///
    /// Pitch comes from `softmax(logits / temperature)`. Step is floored at
    /// zero and duration clamped to `[min_duration, max_duration]`; neither
    /// ever produces an error.
    pub fn sample(&mut self, prediction: &Prediction) -> Result<Note> {
        let pitch = self.sample_pitch(&prediction.pitch_logits)?;
        Ok(Note {
            pitch,
            step: self.clamp_step(prediction.step),
            duration: self.clamp_duration(prediction.duration),
        })
    }

    fn sample_pitch(&mut self, logits: &[f32]) -> Result<u8> {
        if logits.len() != VOCAB_SIZE {
            return Err(Error::ModelInference(format!(
                "expected {} pitch logits, got {}",
                VOCAB_SIZE,
                logits.len()
            )));
        }

        let inv_temperature = 1.0 / self.config.temperature as f64;
        let max = logits
            .iter()
            .copied()
            .filter(|l| l.is_finite())
            .fold(f32::NEG_INFINITY, f32::max);
        if !max.is_finite() {
            return Err(Error::ModelInference(
                "pitch logits contain no finite values".into(),
            ));
        }

        // Shift by the max before exponentiating; the distribution is unchanged.
        let weights: Vec<f64> = logits
            .iter()
            .map(|&l| {
                if l.is_finite() {
                    ((l - max) as f64 * inv_temperature).exp()
                } else {
                    0.0
                }
            })
            .collect();

        let dist = WeightedIndex::new(&weights)
            .map_err(|e| Error::ModelInference(format!("invalid pitch distribution: {}", e)))?;
        Ok(dist.sample(&mut self.rng).min(VOCAB_SIZE - 1) as u8)
    }

    #[inline]
    fn clamp_step(&self, step: f32) -> f32 {
        if step.is_nan() {
            debug!("Predicted step is NaN, using 0");
            0.0
        } else {
            step.max(0.0)
        }
    }

    #[inline]
    fn clamp_duration(&self, duration: f32) -> f32 {
        if duration.is_nan() {
            debug!(
                "Predicted duration is NaN, using {}",
                self.config.min_duration
            );
            self.config.min_duration
        } else {
            duration.clamp(self.config.min_duration, self.config.max_duration)
        }
    }
}
