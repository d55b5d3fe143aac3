//! Example: Basic Protocol - Dispense, Merge, Split, Dispose
//!
//! Runs a short assay on an 8x8 chip:
//!
//! - Two droplets are dispensed from the left edge
//! - They are walked towards each other and merged
//! - The merged droplet is split again and one half leaves the chip
//!
//! Prints every droplet's lifespan and the sound cues, then writes the
//! trajectories as CSV to the temporary directory.

use dmfb_rs::{
    chip::{Edge, GridConfig, PortType},
    output::{CsvConfig, CsvExporter, CsvMetadata, Exporter},
    replay::{compile_and_replay, ReplayConfig},
};

const SCRIPT: &str = "\
input 0,1,8
move 1,1,8,2,8
move 2,2,8,3,8
move 3,3,8,4,8
move 4,4,8,4,7
move 5,4,7,4,6
move 6,4,6,4,5
input 7,1,4
move 8,1,4,2,4
move 9,2,4,2,5
merge 10,2,5,4,5
split 13,3,5,3,6,3,4
move 15,3,6,2,6
move 16,2,6,2,7
move 17,2,7,2,8
output 18,2,8
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("═══════════════════════════════════════════════════════");
    println!("  Basic Protocol - Dispense, Merge, Split, Dispose");
    println!("═══════════════════════════════════════════════════════\n");

    // ====== Chip ======

    let grid = GridConfig::with_default_ports(8, 8)?
        .with_port(Edge::Left, 0, PortType::Input)?
        .with_port(Edge::Left, 4, PortType::Input)?
        .with_port(Edge::Top, 1, PortType::Output)?;
    grid.validate()?;

    println!("Chip: {}x{}", grid.rows(), grid.columns());

    // ====== Replay ======

    let config = ReplayConfig::default().seed(2024);
    let result = compile_and_replay(SCRIPT, &grid, &config)?;

    if let Some(err) = result.fatal() {
        println!("  ✗ replay stopped at t={} s: {}", err.time, err);
    } else {
        println!("  ✓ replay clean");
    }
    println!(
        "  Clock      : {} s .. {} s",
        result.min_time_ms / 1000,
        result.max_time_ms / 1000
    );
    println!("  Droplets   : {}", result.droplets.len());
    println!("  Keyframes  : {}\n", result.keyframe_count());

    for droplet in &result.droplets {
        if let Some((born, gone)) = droplet.lifespan() {
            println!("  droplet {:>2}: {:>5.1} s -> {:>5.1} s", droplet.id, born, gone);
        }
    }

    println!("\nSound cues:");
    for (key_ms, effects) in result.sounds.iter() {
        println!("  {:>6} ms  {:?}", key_ms, effects);
    }

    // ====== Export ======

    let path = std::env::temp_dir().join("dmfb_basic_protocol.csv");
    let metadata = CsvMetadata::from_replay(&result, &grid).script("basic_protocol");
    let exporter = CsvExporter::new(CsvConfig::default().with_metadata(metadata));
    exporter.export_trajectories(&result, &grid, Some(0.1), &path.to_string_lossy())?;

    println!("\nTrajectories written to {}", path.display());
    Ok(())
}
