use maestro_midi_io::list_output_ports;

fn main() {
    println!("=== MIDI Output Devices ===");
    let devices = list_output_ports();
    if devices.is_empty() {
        println!("  (none found)");
    }
    for dev in &devices {
        println!("  [{}] {}", dev.index, dev.name);
    }
}
