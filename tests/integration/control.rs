//! Gesture control stream running alongside the melody

use crate::helpers::*;
use maestro::gesture::ControlMap;
use maestro::prelude::*;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

/// Source stuck inside a frame for `delay`.
struct StalledSource {
    delay: Duration,
}

impl GestureSource for StalledSource {
    fn next_sample(&mut self) -> maestro::gesture::Result<Option<GestureSample>> {
        std::thread::sleep(self.delay);
        Ok(None)
    }
}

fn gesture_config(num_notes: u64) -> SessionConfig {
    let mut config = test_config(num_notes);
    config.gesture_enabled = true;
    config.settling_delay = 0.1;
    config.control = ControlConfig {
        rate_hz: 200.0,
        smoothing_window: 1,
        ..ControlConfig::default()
    };
    config
}

fn sweep_samples(count: usize) -> Vec<GestureSample> {
    (0..count)
        .map(|i| {
            let t = i as f32 / count as f32;
            GestureSample::new(t, 1.0 - t, 0.15, GestureLabel::OpenPalm)
        })
        .collect()
}

#[test]
fn test_controls_sent_and_reset() {
    let source = ScriptedGestureSource::from_samples(sweep_samples(20));
    let released = source.released();
    let (mut session, wire) = recording_session_with(
        gesture_config(5),
        fixed_predictor(60, 0.0, 0.02),
        RecordingSink::new(),
        Some(source),
    );

    let report = session.run().unwrap();

    assert!(report.control.samples > 0);
    assert!(report.control.sent > 0);
    assert_eq!(released.load(Ordering::SeqCst), 1);

    let reset: Vec<(u8, u8)> = session
        .device()
        .sent_cc_keys()
        .into_iter()
        .map(|k| (k.channel, k.cc))
        .collect();
    let default_ccs = ControlMap::default().controllers();
    assert!(!reset.is_empty());
    assert!(reset.iter().all(|(_, cc)| default_ccs.contains(cc)));
    assert_shutdown_tail(&wire, &reset);
}

#[test]
fn test_gesture_disabled_ignores_source() {
    let source = ScriptedGestureSource::from_samples(sweep_samples(20));
    let consumed = source.consumed();
    let mut config = gesture_config(2);
    config.gesture_enabled = false;
    let (mut session, wire) = recording_session_with(
        config,
        fixed_predictor(60, 0.0, 0.01),
        RecordingSink::new(),
        Some(source),
    );

    let report = session.run().unwrap();

    assert_eq!(report.control, ControlStats::default());
    assert_eq!(consumed.load(Ordering::SeqCst), 0);
    assert!(wire.control_changes().is_empty());
}

#[test]
fn test_source_warm_up_failure_keeps_melody() {
    let source = ScriptedGestureSource::from_samples(sweep_samples(5)).failing_warm_up("no camera");
    let (mut session, wire) = recording_session_with(
        gesture_config(3),
        ascending_predictor(60, 0.01),
        RecordingSink::new(),
        Some(source),
    );

    let report = session.run().unwrap();

    assert_eq!(report.termination, Termination::Completed);
    assert_eq!(note_ons(&wire), vec![60, 61, 62]);
    assert!(wire.control_changes().is_empty());
    assert_shutdown_tail(&wire, &[]);
}

#[test]
fn test_controls_share_channel_setting() {
    let mut config = gesture_config(2);
    config.control.channel = 3;
    let source = ScriptedGestureSource::from_samples(sweep_samples(10));
    let (mut session, wire) = recording_session_with(
        config,
        fixed_predictor(60, 0.0, 0.02),
        RecordingSink::new(),
        Some(source),
    );

    session.run().unwrap();

    let ccs = wire.control_changes();
    assert!(!ccs.is_empty());
    assert!(ccs.iter().all(|&(channel, _, _)| channel == 3));
}

#[test]
fn test_stalled_producer_does_not_block_shutdown() {
    let mut config = gesture_config(2);
    config.settling_delay = 0.05;
    config.producer_join_timeout = 0.05;
    let wire = RecordingSink::new();
    let mut session = Orchestrator::builder()
        .config(config)
        .predictor(fixed_predictor(60, 0.0, 0.01))
        .device(OutputDevice::new(Box::new(wire.clone())))
        .broadcaster(EventBroadcaster::new())
        .gesture_source(StalledSource {
            delay: Duration::from_secs(3),
        })
        .build()
        .unwrap();

    let start = Instant::now();
    let report = session.run().unwrap();

    assert!(start.elapsed() < Duration::from_secs(2), "took {:?}", start.elapsed());
    assert_eq!(report.termination, Termination::Completed);
    assert_eq!(report.notes_played, 2);
    assert!(wire.control_changes().is_empty());
    assert_shutdown_tail(&wire, &[]);
}
