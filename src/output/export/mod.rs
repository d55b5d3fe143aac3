//! Export of simulation data
//!
//! # Architecture
//!
//! The [`Exporter`] trait abstracts the file format; each format lives in its
//! own sub-module. Every exporter writes three kinds of tables:
//!
//! | Table          | Source                                           |
//! |----------------|--------------------------------------------------|
//! | trajectories   | droplet keyframes of a [`ReplayResult`]          |
//! | contamination  | the [`ContaminationLog`] of a replay             |
//! | wash route     | the steps of a planned [`WashRoute`]             |
//!
//! Cell coordinates are written the way scripts address them: 1-based, `y`
//! counted from the bottom row.
//!
//! # Available formats
//!
//! | Format  | Module    |
//! |---------|-----------|
//! | CSV     | [`csv`]   |
//!
//! # Usage example
//!
//! ```rust,ignore
//! use dmfb_rs::output::export::{CsvExporter, Exporter};
//!
//! let exporter = CsvExporter::default();
//!
//! // Raw keyframes
//! exporter.export_trajectories(&result, &grid, None, "droplets.csv")?;
//!
//! // Resampled every 100 ms
//! exporter.export_trajectories(&result, &grid, Some(0.1), "droplets_100ms.csv")?;
//!
//! exporter.export_contamination(&result.contamination, &grid, "residue.csv")?;
//! ```

pub mod csv;

pub use csv::{CsvConfig, CsvError, CsvExporter, CsvMetadata};

use crate::chip::GridConfig;
use crate::contamination::ContaminationLog;
use crate::replay::ReplayResult;
use crate::wash::WashRoute;

/// Abstraction over export formats
///
/// # Associated type `Error`
///
/// Each format manages its own errors, so callers can react to them without
/// downcasting a boxed error.
///
/// # Parameter `sample_step`
///
/// - `None`: one row per keyframe
/// - `Some(dt)`: every droplet is sampled every `dt` seconds over the whole
///   simulation; rows where the droplet is not on the chip are skipped
pub trait Exporter {
    type Error: std::error::Error;

    /// Droplet states, one row per droplet and time
    ///
    /// # Errors
    ///
    /// Returns an error if the replay produced no droplet or the file cannot
    /// be written.
    fn export_trajectories(
        &self,
        result: &ReplayResult,
        grid: &GridConfig,
        sample_step: Option<f64>,
        path: &str,
    ) -> Result<(), Self::Error>;

    /// Contamination records in time order
    fn export_contamination(
        &self,
        log: &ContaminationLog,
        grid: &GridConfig,
        path: &str,
    ) -> Result<(), Self::Error>;

    /// Steps of a wash route, staging cells included
    fn export_route(
        &self,
        route: &WashRoute,
        grid: &GridConfig,
        path: &str,
    ) -> Result<(), Self::Error>;
}
