//! Integration test modules for maestro
//!
//! Test categories:
//! - lifecycle: state machine, reports, build-time validation
//! - shutdown: cleanup on completion, on stop and on failure
//! - timing: speed scaling and what the model sees
//! - control: gesture control stream alongside the melodic loop

pub mod control;
pub mod lifecycle;
pub mod shutdown;
pub mod timing;
