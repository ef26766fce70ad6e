//! Test helpers and fixtures for maestro integration tests
//!
//! Sessions run against an in-memory [`RecordingSink`] and an in-process
//! broadcaster, so no MIDI hardware or network is needed.

#![allow(dead_code)]

use maestro::prelude::*;
use maestro::midi::MessageKind;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shortest note the fixtures ask for, in seconds.
pub const TEST_NOTE_SECS: f32 = 0.01;

/// Config that starts immediately and plays `num_notes` short notes.
pub fn test_config(num_notes: u64) -> SessionConfig {
    SessionConfig {
        num_notes: Some(num_notes),
        min_duration: TEST_NOTE_SECS,
        max_duration: 2.0,
        settling_delay: 0.0,
        gesture_enabled: false,
        visualization_enabled: true,
        random_seed: Some(7),
        ..SessionConfig::default()
    }
}

/// Logits that put practically all mass on `pitch`.
pub fn peaked_logits(pitch: u8) -> Vec<f32> {
    let mut logits = vec![-100.0; 128];
    logits[pitch as usize] = 100.0;
    logits
}

/// Predictor that always proposes the same note.
pub fn fixed_predictor(pitch: u8, step: f32, duration: f32) -> FnPredictor {
    FnPredictor::new(move |_, _| {
        Ok(Prediction {
            pitch_logits: peaked_logits(pitch),
            step,
            duration,
        })
    })
}

/// Predictor that walks up from `start` one semitone per call.
pub fn ascending_predictor(start: u8, duration: f32) -> FnPredictor {
    let mut next = start;
    FnPredictor::new(move |_, _| {
        let pitch = next;
        next = next.saturating_add(1).min(127);
        Ok(Prediction {
            pitch_logits: peaked_logits(pitch),
            step: duration,
            duration,
        })
    })
}

/// Predictor that succeeds `ok_calls` times, then fails.
pub fn failing_predictor(ok_calls: usize) -> (FnPredictor, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let predictor = FnPredictor::new(move |_, _| {
        if counter.fetch_add(1, Ordering::SeqCst) >= ok_calls {
            return Err(PredictError::ForwardFailed("model diverged".into()));
        }
        Ok(Prediction {
            pitch_logits: peaked_logits(60),
            step: TEST_NOTE_SECS,
            duration: TEST_NOTE_SECS,
        })
    });
    (predictor, calls)
}

/// Session wired to a recording sink. Returns the sink alongside.
pub fn recording_session(
    config: SessionConfig,
    predictor: impl Predictor + 'static,
) -> (Orchestrator, RecordingSink) {
    recording_session_with(config, predictor, RecordingSink::new(), None)
}

pub fn recording_session_with(
    config: SessionConfig,
    predictor: impl Predictor + 'static,
    wire: RecordingSink,
    gesture: Option<ScriptedGestureSource>,
) -> (Orchestrator, RecordingSink) {
    let mut builder = Orchestrator::builder()
        .config(config)
        .predictor(predictor)
        .device(OutputDevice::new(Box::new(wire.clone())))
        .broadcaster(EventBroadcaster::new());
    if let Some(source) = gesture {
        builder = builder.gesture_source(source);
    }
    let session = builder.build().expect("Failed to build test session");
    (session, wire)
}

/// Note-on pitches in wire order.
pub fn note_ons(wire: &RecordingSink) -> Vec<u8> {
    wire
        .kinds()
        .into_iter()
        .filter_map(|k| match k {
            MessageKind::NoteOn { note, .. } => Some(note),
            _ => None,
        })
        .collect()
}

/// Assert the tail of the wire log is the shutdown sequence: all 128
/// note-offs in order, then a zero for every controller in `reset_ccs`.
pub fn assert_shutdown_tail(wire: &RecordingSink, reset_ccs: &[(u8, u8)]) {
    let kinds = wire.kinds();
    let tail_len = 128 + reset_ccs.len();
    assert!(kinds.len() >= tail_len, "only {} messages", kinds.len());
    let tail = &kinds[kinds.len() - tail_len..];

    for (pitch, kind) in tail[..128].iter().enumerate() {
        match kind {
            MessageKind::NoteOff { note, .. } => assert_eq!(*note as usize, pitch),
            other => panic!("expected note-off {}, got {:?}", pitch, other),
        }
    }
    for (&(channel, cc), kind) in reset_ccs.iter().zip(&tail[128..]) {
        assert_eq!(
            *kind,
            MessageKind::ControlChange {
                channel,
                cc,
                value: 0
            }
        );
    }
    assert!(wire.is_closed());
}
