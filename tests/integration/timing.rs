//! Speed scaling and note timing tests

use crate::helpers::*;
use maestro::midi::MessageKind;
use maestro::prelude::*;
use approx::assert_relative_eq;
use std::time::{Duration, Instant};

#[test]
fn test_speed_scales_played_note_not_context() {
    let config = SessionConfig {
        speed: 2.0,
        ..test_config(1)
    };
    let (mut session, _wire) = recording_session(config, fixed_predictor(64, 0.05, 0.03));
    let viewer = session.broadcaster().subscribe();
    session.run().unwrap();

    let event = viewer
        .next_event(Duration::from_millis(100))
        .unwrap()
        .expect("one event");
    assert_relative_eq!(event.step, 0.1, epsilon = 1e-6);
    assert_relative_eq!(event.duration, 0.06, epsilon = 1e-6);

    // The model keeps seeing what it predicted
    let newest = session.context().newest();
    assert_relative_eq!(newest.pitch, 64.0 / 128.0);
    assert_relative_eq!(newest.step, 0.05, epsilon = 1e-6);
    assert_relative_eq!(newest.duration, 0.03, epsilon = 1e-6);
}

#[test]
fn test_duration_clamped_before_scaling() {
    let config = SessionConfig {
        min_duration: 0.02,
        max_duration: 0.04,
        speed: 0.5,
        ..test_config(2)
    };
    let mut durations = vec![0.001f32, 10.0].into_iter();
    let predictor = FnPredictor::new(move |_, _| {
        Ok(Prediction {
            pitch_logits: peaked_logits(60),
            step: -1.0,
            duration: durations.next().unwrap_or(0.03),
        })
    });
    let (mut session, _wire) = recording_session(config, predictor);
    let viewer = session.broadcaster().subscribe();
    session.run().unwrap();

    let first = viewer.next_event(Duration::from_millis(100)).unwrap().unwrap();
    let second = viewer.next_event(Duration::from_millis(100)).unwrap().unwrap();
    assert_relative_eq!(first.duration, 0.01, epsilon = 1e-6);
    assert_relative_eq!(second.duration, 0.02, epsilon = 1e-6);
    assert_eq!(first.step, 0.0);
}

#[test]
fn test_notes_sound_for_their_duration() {
    let (mut session, wire) = recording_session(test_config(3), fixed_predictor(60, 0.0, 0.05));

    let start = Instant::now();
    session.run().unwrap();
    let elapsed = start.elapsed();

    assert!(elapsed >= Duration::from_millis(150), "took {:?}", elapsed);
    assert_eq!(note_ons(&wire), vec![60, 60, 60]);
}

#[test]
fn test_note_on_then_off_per_note() {
    let (mut session, wire) = recording_session(test_config(2), ascending_predictor(50, 0.01));
    session.run().unwrap();

    let kinds = wire.kinds();
    let expected_prefix = [
        MessageKind::NoteOn {
            channel: 0,
            note: 50,
            velocity: 80,
        },
        MessageKind::NoteOff {
            channel: 0,
            note: 50,
            velocity: 0,
        },
        MessageKind::NoteOn {
            channel: 0,
            note: 51,
            velocity: 80,
        },
        MessageKind::NoteOff {
            channel: 0,
            note: 51,
            velocity: 0,
        },
    ];
    assert_eq!(&kinds[..4], &expected_prefix);
    assert_eq!(kinds.len(), 4 + 128);
}
