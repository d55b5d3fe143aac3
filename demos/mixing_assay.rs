//! Example: Mixing Assay - Strict vs Relaxed Spacing
//!
//! Two droplets are mixed side by side, one row apart. Under strict spacing
//! (target cell and its 8 neighbours) the protocol is rejected; under relaxed
//! spacing (target cell only) it runs to completion.
//!
//! Both policies are also compared with `ErrorPolicy::CollectAll`, which keeps
//! replaying after a violation and reports every one of them.

use dmfb_rs::{
    chip::{Edge, GridConfig, PortType},
    replay::{compile_and_replay, ErrorPolicy, ReplayConfig, ReplayResult, SpacingMode},
};

const SCRIPT: &str = "\
input 0,1,8
move 1,1,8,2,8
move 2,2,8,3,8
input 3,1,6
move 4,1,6,2,6
mix 5,2,6,3,6,3,5,2,5,2,6
mix 5,3,8,4,8,4,7,3,7,3,8
move 9,2,6,2,5
move 10,3,8,2,8
output 11,2,8
";

fn report(label: &str, result: &ReplayResult) {
    println!("  {label}");
    println!("    droplets  : {}", result.droplets.len());
    println!("    end       : {} s", result.max_time_ms / 1000);
    println!("    residue   : {} records", result.contamination.len());
    if result.is_clean() {
        println!("    ✓ no violation");
    }
    for err in &result.errors {
        println!("    ✗ t={:>2} s [{}] {}", err.time, err.kind, err);
    }
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("═══════════════════════════════════════════════════════");
    println!("  Mixing Assay - Strict vs Relaxed Spacing");
    println!("═══════════════════════════════════════════════════════\n");

    let grid = GridConfig::new(8, 8)?
        .with_port(Edge::Left, 0, PortType::Input)?
        .with_port(Edge::Left, 2, PortType::Input)?
        .with_port(Edge::Top, 1, PortType::Output)?;
    grid.validate()?;

    let configurations = [
        ("strict, halt on first", SpacingMode::Strict, ErrorPolicy::HaltOnFirst),
        ("strict, collect all", SpacingMode::Strict, ErrorPolicy::CollectAll),
        ("relaxed, halt on first", SpacingMode::Relaxed, ErrorPolicy::HaltOnFirst),
    ];

    for (label, spacing, policy) in configurations {
        let config = ReplayConfig::default()
            .spacing(spacing)
            .error_policy(policy)
            .seed(5);
        let result = compile_and_replay(SCRIPT, &grid, &config)?;
        report(label, &result);
    }

    Ok(())
}
