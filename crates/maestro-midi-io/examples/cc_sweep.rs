//! Sweep one controller so a DAW can MIDI-learn it.
//!
//! Usage: cargo run --example cc_sweep -- <cc> [port-substring]

use maestro_core::StopSignal;
use maestro_midi_io::cc::{sweep, SweepConfig};
use maestro_midi_io::{CcKey, OutputDevice, PortSelection};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let cc: u8 = args.next().as_deref().unwrap_or("74").parse()?;
    let selection = match args.next() {
        Some(name) => PortSelection::Named(name),
        None => PortSelection::FirstAvailable,
    };

    let device = OutputDevice::open(&selection, 0)?;
    println!("Sweeping CC {} on '{}'", cc, device.name());

    let outcome = sweep(
        &device,
        CcKey::new(cc, 0),
        &SweepConfig::default(),
        &StopSignal::new(),
    )?;
    println!("{:?}", outcome);

    device.close();
    Ok(())
}
