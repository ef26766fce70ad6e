//! Shutdown sequence tests
//!
//! Every way a session can end must leave the synth silent and the port
//! closed.

use crate::helpers::*;
use maestro::midi::MessageKind;
use maestro::prelude::*;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_shutdown_after_completion() {
    let (mut session, wire) = recording_session(test_config(3), fixed_predictor(60, 0.0, 0.01));
    session.run().unwrap();

    assert_shutdown_tail(&wire, &[]);
    assert!(session.device().is_closed());
    assert!(!session.broadcaster().is_serving());
}

#[test]
fn test_stop_interrupts_long_note() {
    let config = SessionConfig {
        max_duration: 10.0,
        ..test_config(100)
    };
    let (mut session, wire) = recording_session(config, fixed_predictor(62, 0.0, 10.0));

    let stop = session.stop_handle();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        stop.stop();
    });

    let start = Instant::now();
    let report = session.run().unwrap();
    stopper.join().unwrap();

    assert!(start.elapsed() < Duration::from_secs(2), "took {:?}", start.elapsed());
    assert_eq!(report.termination, Termination::Stopped);

    // The interrupted note still counts and still gets its own note-off
    assert_eq!(report.notes_played, 1);
    assert_eq!(session.context().newest().duration, 10.0);
    let kinds = wire.kinds();
    assert_eq!(
        kinds[1],
        MessageKind::NoteOff {
            channel: 0,
            note: 62,
            velocity: 0
        }
    );
    assert_shutdown_tail(&wire, &[]);
}

#[test]
fn test_stop_during_settling_delay() {
    let config = SessionConfig {
        settling_delay: 30.0,
        ..test_config(10)
    };
    let (mut session, wire) = recording_session(config, fixed_predictor(60, 0.0, 0.01));

    let stop = session.stop_handle();
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        stop.stop();
    });

    let start = Instant::now();
    let report = session.run().unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(report.termination, Termination::Stopped);
    assert_eq!(report.notes_played, 0);
    assert!(note_ons(&wire).is_empty());
    assert_eq!(wire.kinds().len(), 128);
    assert_shutdown_tail(&wire, &[]);
}

#[test]
fn test_stop_before_run() {
    let (mut session, wire) = recording_session(test_config(10), fixed_predictor(60, 0.0, 0.01));
    session.stop_handle().stop();

    let report = session.run().unwrap();

    assert_eq!(report.termination, Termination::Stopped);
    assert_eq!(report.notes_played, 0);
    assert_shutdown_tail(&wire, &[]);
}

#[test]
fn test_predictor_failure_still_cleans_up() {
    let (predictor, calls) = failing_predictor(2);
    let (mut session, wire) = recording_session(test_config(10), predictor);

    let err = session.run().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ModelInference);
    assert!(err.is_fatal());
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 3);
    assert_eq!(session.notes_played(), 2);
    assert_eq!(session.state(), SessionState::Stopped);
    assert_shutdown_tail(&wire, &[]);
}

#[test]
fn test_malformed_logits_are_model_errors() {
    let predictor = FnPredictor::new(|_, _| {
        Ok(Prediction {
            pitch_logits: vec![0.0; 12],
            step: 0.1,
            duration: 0.1,
        })
    });
    let (mut session, wire) = recording_session(test_config(1), predictor);

    let err = session.run().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ModelInference);
    assert_shutdown_tail(&wire, &[]);
}

#[test]
fn test_device_failure_reported_and_cleaned_up() {
    let wire = RecordingSink::new().fail_when(|m| matches!(m.kind(), MessageKind::NoteOn { .. }));
    let (mut session, wire) = recording_session_with(
        test_config(5),
        fixed_predictor(60, 0.0, 0.01),
        wire,
        None,
    );

    let err = session.run().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Device);
    assert_eq!(session.notes_played(), 0);
    assert_shutdown_tail(&wire, &[]);
}

#[test]
fn test_failed_note_offs_do_not_abort_cleanup() {
    // Every note-off for pitch 0 fails; the rest of cleanup goes ahead
    let wire = RecordingSink::new().fail_when(|m| {
        matches!(m.kind(), MessageKind::NoteOff { note: 0, .. })
    });
    let (mut session, wire) = recording_session_with(
        test_config(1),
        fixed_predictor(60, 0.0, 0.01),
        wire,
        None,
    );

    let report = session.run().unwrap();

    assert_eq!(report.termination, Termination::Completed);
    assert_eq!(wire.note_offs().len(), 1 + 127);
    assert!(wire.is_closed());
}
