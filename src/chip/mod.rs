//! Chip model
//!
//! The chip is a `rows x columns` electrode grid. Each perimeter cell may sit
//! beside a port through which droplets enter (`input`), leave (`output`), or
//! through which the cleaning droplet enters (`wash`) and leaves (`waste`).
//!
//! This module is pure data plus geometric predicates:
//!
//! - **`GridConfig`**: dimensions, port layout, validation, JSON loading
//! - **`Position`**: signed cell coordinates (staging cells lie off the chip)
//! - **`PortType`** / **`Edge`**: port kinds and chip sides
//!
//! # Example
//!
//! ```rust
//! use dmfb_rs::chip::{Edge, GridConfig, PortType};
//!
//! # fn main() -> Result<(), dmfb_rs::error::ConfigError> {
//! let grid = GridConfig::with_default_ports(8, 8)?
//!     .with_port(Edge::Left, 0, PortType::Input)?
//!     .with_port(Edge::Right, 4, PortType::Output)?;
//!
//! grid.validate()?;
//! assert!(grid.has_wash());
//! # Ok(())
//! # }
//! ```

mod grid;

pub use grid::{
    ChipDescription,
    Edge,
    GridConfig,
    PortType,
    Position,
    DIRECTIONS_4,
    DIRECTIONS_8,
    MAX_DIMENSION,
    MIN_DIMENSION,
};
