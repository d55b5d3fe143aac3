//! dmfb-rs: Digital Microfluidic Biochip Simulator
//!
//! Simulates droplets moving on a rectangular electrode grid under a textual
//! command script, and plans the cleaning route that washes away the residue
//! they leave behind.
//!
//! # Architecture
//!
//! dmfb-rs is built around two engines:
//!
//! 1. **Droplet choreography**
//!    - Scripts compile into primitive, time-stamped commands
//!    - Commands replay into keyframed trajectories, validated against port
//!      types and the spacing constraint between droplets
//!
//! 2. **Wash routing**
//!    - Contamination accumulates as playback advances
//!    - A constrained BFS plans a route through every reachable dirty cell
//!
//! Rendering, audio and timers are left to the host application, which drives
//! a [`session::Session`] and draws what it returns.
//!
//! # Quick Start
//!
//! ```rust
//! use dmfb_rs::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // 1. Describe the chip
//! let grid = GridConfig::with_default_ports(8, 8)?
//!     .with_port(Edge::Left, 0, PortType::Input)?
//!     .with_port(Edge::Top, 1, PortType::Output)?;
//!
//! // 2. Compile and replay a script
//! let script = "input 0,1,8\nmove 1,1,8,2,8\noutput 5,2,8";
//! let mut session = Session::load(grid, script, &ReplayConfig::default())?;
//! assert!(session.result().is_clean());
//!
//! // 3. Play it to the end
//! while !session.advance(100).finished {}
//!
//! // 4. Wash the chip
//! match session.wash()? {
//!     WashPlan::Route(route) => println!("wash takes {} s", route.duration_secs()),
//!     WashPlan::NothingToClean => println!("chip already clean"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`chip`]: grid dimensions and perimeter ports
//! - [`script`]: command script compiler
//! - [`replay`]: trajectory builder, keyframes, interpolation, sound cues
//! - [`contamination`]: contamination log and per-cell residue
//! - [`wash`]: obstacle mask and wash router
//! - [`session`]: playback clock driven by a host UI
//! - [`output`]: CSV export

pub mod chip;
pub mod contamination;
pub mod error;
pub mod output;
pub mod replay;
pub mod script;
pub mod session;
pub mod wash;

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use dmfb_rs::prelude::*;
    //! ```
    pub use crate::chip::{Edge, GridConfig, PortType, Position};
    pub use crate::contamination::{ContaminationLog, ContaminationMap};
    pub use crate::error::{ConfigError, ParseError, ReplayError, SessionError, WashError};
    pub use crate::replay::{compile_and_replay, ErrorPolicy, ReplayConfig, ReplayResult, SpacingMode, TrajectoryBuilder};
    pub use crate::script::compile;
    pub use crate::session::Session;
    pub use crate::wash::{ObstacleMask, WashPlan, WashRouter};
}
