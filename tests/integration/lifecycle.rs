//! Session lifecycle tests
//!
//! State transitions, reports, seeding and build-time validation.

use crate::helpers::*;
use maestro::prelude::*;
use std::time::Duration;

#[test]
fn test_completed_session_report() {
    let (mut session, wire) = recording_session(test_config(4), ascending_predictor(60, 0.01));
    assert_eq!(session.state(), SessionState::Idle);

    let report = session.run().unwrap();

    assert_eq!(report.notes_played, 4);
    assert_eq!(report.termination, Termination::Completed);
    assert_eq!(report.control, ControlStats::default());
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(session.notes_played(), 4);
    assert_eq!(note_ons(&wire), vec![60, 61, 62, 63]);
}

#[test]
fn test_run_twice_is_invalid_state() {
    let (mut session, _wire) = recording_session(test_config(1), fixed_predictor(60, 0.0, 0.01));
    session.run().unwrap();

    let err = session.run().unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidState {
            expected: SessionState::Idle,
            actual: SessionState::Stopped
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_window_keeps_most_recent_notes() {
    let config = SessionConfig {
        sequence_length: 8,
        ..test_config(20)
    };
    let (mut session, _wire) = recording_session(config, ascending_predictor(40, 0.01));
    session.run().unwrap();

    assert_eq!(session.context().len(), 8);

    let pitches: Vec<f32> = session
        .context()
        .snapshot()
        .notes()
        .iter()
        .map(|n| n.pitch)
        .collect();
    let expected: Vec<f32> = (52u8..60).map(|p| p as f32 / 128.0).collect();
    assert_eq!(pitches, expected);
}

#[test]
fn test_events_follow_notes() {
    let (mut session, _wire) = recording_session(test_config(3), ascending_predictor(69, 0.01));
    let viewer = session.broadcaster().subscribe();
    session.run().unwrap();

    let mut events = Vec::new();
    while let Ok(Some(event)) = viewer.next_event(Duration::from_millis(10)) {
        events.push(event);
    }

    assert_eq!(events.len(), 3);
    assert_eq!(events[0].note_name, "A4");
    assert_eq!(events[0].velocity, 80);
    assert_eq!(
        events.iter().map(|e| e.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
    assert_eq!(
        events.iter().map(|e| e.pitch).collect::<Vec<_>>(),
        vec![69, 70, 71]
    );
    assert_eq!(session.broadcaster().events_broadcast(), 3);
}

#[test]
fn test_visualization_disabled_emits_nothing() {
    let config = SessionConfig {
        visualization_enabled: false,
        ..test_config(2)
    };
    let (mut session, _wire) = recording_session(config, fixed_predictor(60, 0.0, 0.01));
    let viewer = session.broadcaster().subscribe();
    session.run().unwrap();

    assert!(viewer.drain().is_empty());
    assert_eq!(session.broadcaster().events_broadcast(), 0);
}

#[test]
fn test_seed_length_mismatch() {
    let err = Orchestrator::builder()
        .config(test_config(1))
        .predictor(fixed_predictor(60, 0.0, 0.01))
        .seed(seed::c_major(3))
        .device(OutputDevice::new(Box::new(RecordingSink::new())))
        .broadcaster(EventBroadcaster::new())
        .build()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_missing_predictor() {
    let wire = RecordingSink::new();
    let err = Orchestrator::builder()
        .config(test_config(1))
        .device(OutputDevice::new(Box::new(wire.clone())))
        .broadcaster(EventBroadcaster::new())
        .build()
        .unwrap_err();

    assert!(matches!(err, Error::InvalidConfig(_)));
    assert!(wire.messages().is_empty());
}

#[test]
fn test_invalid_config_rejected_at_build() {
    let config = SessionConfig {
        temperature: 0.0,
        ..test_config(1)
    };
    let err = Orchestrator::builder()
        .config(config)
        .predictor(fixed_predictor(60, 0.0, 0.01))
        .device(OutputDevice::new(Box::new(RecordingSink::new())))
        .build()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn test_seed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seed.json");
    std::fs::write(&path, "[[72, 0.25, 0.2], [74, 0.25, 0.2], [76, 0.25, 0.2]]").unwrap();

    let config = SessionConfig {
        sequence_length: 3,
        seed_file: Some(path),
        ..test_config(1)
    };
    let (session, _wire) = recording_session(config, fixed_predictor(60, 0.0, 0.01));

    let snapshot = session.context().snapshot();
    assert_eq!(snapshot.shape(), [3, 3]);
    assert_eq!(snapshot.notes()[0].pitch, 72.0 / 128.0);
    assert_eq!(session.context().newest().pitch, 76.0 / 128.0);
}

#[test]
fn test_missing_seed_file() {
    let config = SessionConfig {
        seed_file: Some("/nonexistent/seed.json".into()),
        ..test_config(1)
    };
    let err = Orchestrator::builder()
        .config(config)
        .predictor(fixed_predictor(60, 0.0, 0.01))
        .device(OutputDevice::new(Box::new(RecordingSink::new())))
        .broadcaster(EventBroadcaster::new())
        .build()
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Configuration);
}
