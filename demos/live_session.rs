//! # Live Session
//!
//! Play a generated melody on the first MIDI output while a simulated hand
//! sweeps the filter and reverb. Open a WebSocket viewer on port 8765 to
//! watch the notes.
//!
//! **Concepts:** Session config, predictor boundary, gesture control, Ctrl-C
//!
//! ```bash
//! cargo run --example live_session -- session.toml
//! ```
//!
//! The model here is a stand-in random walk; plug a real forward pass into
//! `FnPredictor` the same way.

use maestro::prelude::*;
use rand::Rng;

fn random_walk() -> FnPredictor {
    let mut rng = rand::thread_rng();
    let mut centre: i32 = 60;
    FnPredictor::new(move |_window, _shape| {
        centre = (centre + rng.gen_range(-3..=3)).clamp(48, 84);
        let logits = (0..128)
            .map(|p| -((p - centre) as f32).powi(2) / 8.0)
            .collect();
        Ok(Prediction {
            pitch_logits: logits,
            step: rng.gen_range(0.1..0.4),
            duration: rng.gen_range(0.15..0.6),
        })
    })
}

fn main() -> maestro::Result<()> {
    tracing_subscriber::fmt::init();

    let config = match std::env::args().nth(1) {
        Some(path) => SessionConfig::from_toml_file(path)?,
        None => SessionConfig::default(),
    };

    for port in list_output_ports() {
        println!("  [{}] {}", port.index, port.name);
    }

    let mut session = Orchestrator::builder()
        .config(config)
        .predictor(random_walk())
        .gesture_source(SimulatedGestureSource::new())
        .build()?;

    let stop = session.stop_handle();
    std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                eprintln!("Ctrl-C handler unavailable: {}", e);
                return;
            }
        };
        if runtime.block_on(tokio::signal::ctrl_c()).is_ok() {
            println!("\nStopping...");
        }
        stop.stop();
    });

    println!("Playing on '{}'. Ctrl-C to stop.", session.device().name());
    let report = session.run()?;
    println!(
        "{} notes, {} control changes ({:?})",
        report.notes_played, report.control.sent, report.termination
    );

    Ok(())
}
