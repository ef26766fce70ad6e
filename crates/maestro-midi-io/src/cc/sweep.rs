//! Single-controller sweeps for MIDI learn.
//!
//! Hosts that support MIDI learn bind a parameter to the first controller
//! they see move. Sweeping exactly one CC up and down makes that binding
//! unambiguous.

use super::CcKey;
use crate::device::OutputDevice;
use crate::error::Result;
use maestro_core::StopSignal;
use std::time::Duration;
use tracing::info;

const PARK_VALUE: u8 = 64;
const STEP: usize = 2;

#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Time for one full 0 → 127 → 0 pass.
    pub duration: Duration,
    pub repetitions: u32,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(3),
            repetitions: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Completed,
    Stopped,
}

/// Sweep `key` up (0, 2 .. 126) then down (127, 125 .. 1) `repetitions`
/// times, then park it at 64.
///
/// The controller is parked even when `stop` cuts the sweep short.
pub fn sweep(
    device: &OutputDevice,
    key: CcKey,
    config: &SweepConfig,
    stop: &StopSignal,
) -> Result<SweepOutcome> {
    let interval = config.duration / 128;
    let up = (0..=127u8).step_by(STEP);
    let down = (0..=127u8).rev().step_by(STEP);
    let pass: Vec<u8> = up.chain(down).collect();

    info!("Sweeping {} ({} passes)", key, config.repetitions);

    let mut outcome = SweepOutcome::Completed;
    'reps: for _ in 0..config.repetitions {
        for &value in &pass {
            device.send_cc(key.cc, value, key.channel)?;
            if stop.wait_timeout(interval) {
                outcome = SweepOutcome::Stopped;
                break 'reps;
            }
        }
    }

    device.send_cc(key.cc, PARK_VALUE, key.channel)?;
    Ok(outcome)
}
