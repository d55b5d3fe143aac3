//! Output of simulation results
//!
//! Rendering and audio belong to the host application; this module only
//! turns replay data into files for external analysis.
//!
//! ```text
//! output/
//! ├── mod.rs              ← This file
//! └── export/             ← Data export
//!     ├── mod.rs          ← Exporter trait
//!     └── csv.rs
//! ```

pub mod export;

pub use export::{CsvConfig, CsvError, CsvExporter, CsvMetadata, Exporter};
