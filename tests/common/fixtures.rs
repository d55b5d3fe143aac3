//! Chips and scripts shared by the integration tests

use dmfb_rs::chip::{Edge, GridConfig, PortType};

/// 8x8 chip: inputs at script cells (1, 8) and (1, 4), output at (2, 8),
/// wash at (1, 1) and waste at (8, 8)
pub fn demo_chip() -> GridConfig {
    GridConfig::with_default_ports(8, 8)
        .and_then(|grid| grid.with_port(Edge::Left, 0, PortType::Input))
        .and_then(|grid| grid.with_port(Edge::Left, 4, PortType::Input))
        .and_then(|grid| grid.with_port(Edge::Top, 1, PortType::Output))
        .expect("demo chip is well formed")
}

/// One droplet in, one step right, out
pub const SIMPLE_SCRIPT: &str = "\
input 0,1,8
move 1,1,8,2,8
output 5,2,8
";

/// Two droplets meet on script cell (3, 5)
pub const MERGE_SCRIPT: &str = "\
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
";

/// One droplet breaks into script cells (2, 7) and (4, 7)
pub const SPLIT_SCRIPT: &str = "\
input 0,1,8
move 1,1,8,2,8
move 2,2,8,3,8
move 3,3,8,3,7
split 4,3,7,2,7,4,7
";

/// A droplet circles a 2x2 block then leaves
pub const MIX_SCRIPT: &str = "\
input 0,1,8
move 1,1,8,2,8
mix 3,2,8,3,8,3,7,2,7,2,8
output 8,2,8
";
