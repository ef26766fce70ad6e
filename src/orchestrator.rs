//! The performance session: melodic loop, control stream, broadcast and
//! shutdown.

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::state::{AtomicSessionState, SessionState};
use maestro_broadcast::{EventBroadcaster, VisualizationEvent};
use maestro_core::{ContextWindow, Note, NoteSampler, Predictor, StopHandle, StopSignal};
use maestro_gesture::{ControlStats, ControlStreamProducer, GestureSource};
use maestro_midi_io::{NoteOutcome, OutputDevice};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Why the melodic loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// `num_notes` were played.
    Completed,
    /// Stopped through a [`StopHandle`].
    Stopped,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionReport {
    pub notes_played: u64,
    pub termination: Termination,
    pub control: ControlStats,
}

/// Runs one performance session.
///
/// Owns the output device, the context window and the broadcaster. The
/// control producer only borrows the device through an `Arc` for sends;
/// closing it is the orchestrator's job.
///
/// # Example
///
/// ```ignore
/// use maestro::prelude::*;
///
/// let mut session = Orchestrator::builder()
///     .config(SessionConfig::default())
///     .predictor(my_model)
///     .gesture_source(SimulatedGestureSource::new())
///     .build()?;
///
/// // Stop after a minute from another thread
/// let stop = session.stop_handle();
/// std::thread::spawn(move || {
///     std::thread::sleep(std::time::Duration::from_secs(60));
///     stop.stop();
/// });
///
/// let report = session.run()?;
/// ```
pub struct Orchestrator {
    config: SessionConfig,
    state: AtomicSessionState,
    stop: StopSignal,
    predictor: Box<dyn Predictor>,
    sampler: NoteSampler,
    window: ContextWindow,
    device: Arc<OutputDevice>,
    broadcaster: EventBroadcaster,
    gesture_source: Option<Box<dyn GestureSource>>,
    notes_played: u64,
}

impl Orchestrator {
    pub fn builder() -> crate::OrchestratorBuilder {
        crate::OrchestratorBuilder::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        config: SessionConfig,
        predictor: Box<dyn Predictor>,
        sampler: NoteSampler,
        window: ContextWindow,
        device: Arc<OutputDevice>,
        broadcaster: EventBroadcaster,
        gesture_source: Option<Box<dyn GestureSource>>,
    ) -> Self {
        Self {
            config,
            state: AtomicSessionState::new(SessionState::Idle),
            stop: StopSignal::new(),
            predictor,
            sampler,
            window,
            device,
            broadcaster,
            gesture_source,
            notes_played: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.load()
    }

    /// Cloneable handle that stops the session from any thread, interrupting
    /// whatever wait is in progress.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// History the predictor sees. Holds unscaled notes.
    pub fn context(&self) -> &ContextWindow {
        &self.window
    }

    pub fn device(&self) -> &Arc<OutputDevice> {
        &self.device
    }

    pub fn broadcaster(&self) -> &EventBroadcaster {
        &self.broadcaster
    }

    pub fn notes_played(&self) -> u64 {
        self.notes_played
    }

    /// Run the session to completion.
    ///
    /// Blocks the calling thread: each note sleeps for its (scaled)
    /// duration. From async code, run it under `spawn_blocking`. Cleanup always runs, and a fatal error is returned only
    /// after it has.
    pub fn run(&mut self) -> Result<SessionReport> {
        self.state
            .transition(SessionState::Idle, SessionState::Running)
            .map_err(|actual| Error::InvalidState {
                expected: SessionState::Idle,
                actual,
            })?;

        info!(
            "Session started: temperature {}, velocity {}, speed {}x, output '{}'",
            self.config.temperature,
            self.config.velocity,
            self.config.speed,
            self.device.name()
        );

        let producer = self.start_producer();
        let outcome = self.perform();

        self.state.store(SessionState::Stopping);
        let control = self.cleanup(producer);
        self.state.store(SessionState::Stopped);

        match outcome {
            Ok(termination) => {
                info!(
                    "Session {:?} after {} notes",
                    termination, self.notes_played
                );
                Ok(SessionReport {
                    notes_played: self.notes_played,
                    termination,
                    control,
                })
            }
            Err(e) => {
                error!("Session failed after {} notes: {}", self.notes_played, e);
                Err(e)
            }
        }
    }

    fn start_producer(&mut self) -> Option<ControlStreamProducer> {
        if !self.config.gesture_enabled {
            return None;
        }
        let Some(source) = self.gesture_source.take() else {
            debug!("Gesture control enabled but no source attached");
            return None;
        };

        match ControlStreamProducer::spawn(
            source,
            Arc::clone(&self.device),
            self.config.control.clone(),
        ) {
            Ok(producer) => Some(producer),
            Err(e) => {
                warn!("Control stream not started: {}", e);
                None
            }
        }
    }

    /// Settling delay, then the melodic loop.
    fn perform(&mut self) -> Result<Termination> {
        if self.stop.wait_timeout(self.config.settling_delay()) {
            return Ok(Termination::Stopped);
        }

        let speed = self.config.speed;
        let velocity = self.config.velocity;

        while self.config.num_notes.map_or(true, |n| self.notes_played < n) {
            if self.stop.is_stopped() {
                return Ok(Termination::Stopped);
            }

            let snapshot = self.window.snapshot();
            let prediction = self.predictor.predict(&snapshot, self.config.temperature)?;
            let note = self.sampler.sample(&prediction)?;

            let played = Note::new(note.pitch, note.step * speed, note.duration * speed);
            let hold = Duration::try_from_secs_f32(played.duration).map_err(|e| {
                Error::InvalidConfig(format!("note duration {}: {}", played.duration, e))
            })?;

            info!(
                "♪ {:4}: {:4} (pitch={:3}) step={:.3}s dur={:.3}s",
                self.notes_played + 1,
                played.name(),
                played.pitch,
                played.step,
                played.duration
            );

            if self.config.visualization_enabled {
                let event = VisualizationEvent::new(&played, velocity, self.notes_played);
                let outcome = self.broadcaster.broadcast(&event);
                debug!("Event {}: {:?}", self.notes_played, outcome);
            }

            let outcome = self.device.play_note(played.pitch, hold, velocity, &self.stop)?;

            self.window.append(&note);
            self.notes_played += 1;

            if outcome == NoteOutcome::Interrupted {
                return Ok(Termination::Stopped);
            }
        }

        Ok(Termination::Completed)
    }

    /// Best-effort teardown. Every step runs even if an earlier one failed.
    fn cleanup(&mut self, producer: Option<ControlStreamProducer>) -> ControlStats {
        // Wake anything still waiting on the session signal.
        self.stop.stop();

        let mut control = ControlStats::default();
        if let Some(mut producer) = producer {
            if !producer.stop(self.config.producer_join_timeout()) {
                warn!("Control stream still running at shutdown");
            }
            control = producer.stats();
        }

        if let Err(e) = self.device.all_notes_off() {
            warn!("All-notes-off incomplete: {}", e);
        }
        if let Err(e) = self.device.reset_sent_ccs() {
            warn!("Controller reset incomplete: {}", e);
        }
        self.device.close();
        self.broadcaster.shutdown();

        info!("Cleanup complete");
        control
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("state", &self.state())
            .field("notes_played", &self.notes_played)
            .field("device", &self.device)
            .finish()
    }
}
