//! Trajectory replay
//!
//! Turns a compiled [`CommandList`](crate::script::CommandList) into droplet
//! trajectories:
//!
//! - **`droplet`**: keyframes, droplets and eased interpolation
//! - **`builder`**: the replay state machine ([`TrajectoryBuilder`])
//! - **`config`**: error policy and spacing mode ([`ReplayConfig`])
//! - **`sound`**: sound-trigger timeline ([`SoundTimeline`])
//! - **`result`**: everything a replay produces ([`ReplayResult`])
//!
//! # Example
//!
//! ```rust
//! use dmfb_rs::chip::{Edge, GridConfig, PortType};
//! use dmfb_rs::replay::{compile_and_replay, ReplayConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let grid = GridConfig::new(8, 8)?
//!     .with_port(Edge::Left, 0, PortType::Input)?
//!     .with_port(Edge::Top, 1, PortType::Output)?;
//!
//! let result = compile_and_replay("input 0,1,8\nmove 1,1,8,2,8", &grid, &ReplayConfig::default())?;
//!
//! let state = result.droplets[0].state_at(1.5).unwrap();
//! assert!((state.x - 0.5).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```

mod builder;
mod config;
mod droplet;
mod occupancy;
mod result;
mod sound;

pub use builder::TrajectoryBuilder;
pub use config::{ErrorPolicy, ReplayConfig, SpacingMode};
pub use droplet::{
    easing,
    interpolate,
    Color,
    Droplet,
    DropletId,
    DropletSnapshot,
    Keyframe,
    EPS,
    MERGE_INTERVAL,
    RADIUS,
    SOUND_OFFSET,
    SPLIT_INTERVAL,
};
pub use result::ReplayResult;
pub use sound::{SoundEffects, SoundTimeline};

use crate::chip::GridConfig;
use crate::error::ParseError;

/// Compile a script and replay it
///
/// Parse errors abort before anything is replayed; replay violations are
/// reported inside the returned [`ReplayResult`].
pub fn compile_and_replay(script: &str, grid: &GridConfig, config: &ReplayConfig) -> Result<ReplayResult, ParseError> {
    let commands = crate::script::compile(script, grid)?;
    Ok(TrajectoryBuilder::new(grid, *config).replay(&commands))
}
