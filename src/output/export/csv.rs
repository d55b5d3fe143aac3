//! CSV export of replay results
//!
//! Plain CSV readable by spreadsheets, pandas or any plotting tool.
//!
//! # Features
//!
//! - **Metadata support**: optional `#`-prefixed header with chip and replay info
//! - **Customizable**: delimiter, precision, decimal separator
//! - **Resampling**: trajectories either as raw keyframes or on a fixed time step
//!
//! # Tables
//!
//! ## Trajectories
//!
//! ```csv
//! droplet,t,x,y,rx,ry,opacity,r,g,b
//! 0,-1.000,0.000,8.000,0.000,0.000,0.000,212.000,91.000,47.000
//! 0,0.000,1.000,8.000,0.400,0.400,255.000,212.000,91.000,47.000
//! ```
//!
//! ## Contamination
//!
//! ```csv
//! time,droplet,x,y
//! 0,0,1,8
//! 2,0,2,8
//! ```
//!
//! ## Wash route
//!
//! ```csv
//! step,x,y
//! 0,1,0
//! 1,1,1
//! ```
//!
//! ## With Metadata
//!
//! ```csv
//! # DMFB Simulation Data
//! # Generated: 2026-10-15T09:12:44.021+00:00
//! # Chip: 8x8
//! # Droplets: 3
//! # Duration: 12 s
//! #
//! droplet,t,x,y,rx,ry,opacity,r,g,b
//! ...
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};

use thiserror::Error;

use crate::chip::GridConfig;
use crate::contamination::ContaminationLog;
use crate::output::export::Exporter;
use crate::replay::{DropletSnapshot, ReplayResult};
use crate::wash::WashRoute;

// =================================================================================================
// Errors
// =================================================================================================

/// CSV export failure
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("cannot write CSV file: {0}")]
    Io(#[from] std::io::Error),

    #[error("empty data: {0}")]
    EmptyData(&'static str),

    #[error("sample step must be a positive number of seconds, got {0}")]
    InvalidSampleStep(f64),
}

// =================================================================================================
// Configuration Structures
// =================================================================================================

/// Configuration for CSV export
///
/// # Example
///
/// ```rust
/// use dmfb_rs::output::export::{CsvConfig, CsvMetadata};
///
/// let config = CsvConfig::default()
///     .delimiter(';')
///     .precision(2)
///     .with_metadata(CsvMetadata::default());
/// assert!(config.include_metadata);
/// ```
#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Column delimiter (default: ',')
    pub delimiter: char,

    /// Decimal separator (default: '.')
    pub decimal_separator: char,

    /// Decimal places for floating-point values (default: 3)
    pub precision: usize,

    /// Include metadata header comments (default: false)
    pub include_metadata: bool,

    pub metadata: Option<CsvMetadata>,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            decimal_separator: '.',
            precision: 3,
            include_metadata: false,
            metadata: None,
        }
    }
}

impl CsvConfig {
    /// European CSV: semicolon delimiter, comma decimal separator
    pub fn european() -> Self {
        Self {
            delimiter: ';',
            decimal_separator: ',',
            ..Default::default()
        }
    }

    /// Builder pattern: set delimiter
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Builder pattern: set precision
    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Builder pattern: enable metadata
    pub fn with_metadata(mut self, metadata: CsvMetadata) -> Self {
        self.include_metadata = true;
        self.metadata = Some(metadata);
        self
    }
}

/// Metadata for CSV header comments
///
/// Only the fields that are set are written.
#[derive(Debug, Clone, Default)]
pub struct CsvMetadata {
    /// Chip size as `(rows, columns)`
    pub chip: Option<(usize, usize)>,

    /// Name of the script the data comes from
    pub script: Option<String>,

    pub droplets: Option<usize>,

    /// Simulation length, seconds
    pub duration: Option<f64>,

    /// Number of replay violations
    pub violations: Option<usize>,

    /// Additional custom parameters
    pub custom: Vec<(String, String)>,
}

impl CsvMetadata {
    /// Metadata summarizing a replay
    pub fn from_replay(result: &ReplayResult, grid: &GridConfig) -> Self {
        Self {
            chip: Some((grid.rows(), grid.columns())),
            droplets: Some(result.droplets.len()),
            duration: Some(result.duration_secs()),
            violations: Some(result.errors.len()),
            ..Default::default()
        }
    }

    /// Builder pattern: set the script name
    pub fn script(mut self, name: impl Into<String>) -> Self {
        self.script = Some(name.into());
        self
    }

    /// Add custom parameter
    pub fn add_custom(&mut self, key: String, value: String) {
        self.custom.push((key, value));
    }
}

// =================================================================================================
// Helper Functions
// =================================================================================================

fn write_metadata_header(out: &mut impl Write, metadata: &CsvMetadata) -> Result<(), CsvError> {
    writeln!(out, "# DMFB Simulation Data")?;
    writeln!(out, "# Generated: {}", chrono::Utc::now().to_rfc3339())?;

    if let Some((rows, columns)) = metadata.chip {
        writeln!(out, "# Chip: {rows}x{columns}")?;
    }
    if let Some(script) = &metadata.script {
        writeln!(out, "# Script: {script}")?;
    }
    if let Some(droplets) = metadata.droplets {
        writeln!(out, "# Droplets: {droplets}")?;
    }
    if let Some(duration) = metadata.duration {
        writeln!(out, "# Duration: {duration} s")?;
    }
    if let Some(violations) = metadata.violations {
        writeln!(out, "# Violations: {violations}")?;
    }
    for (key, value) in &metadata.custom {
        writeln!(out, "# {key}: {value}")?;
    }

    writeln!(out, "#")?;
    Ok(())
}

/// Format number with configured precision and decimal separator
fn format_number(value: f64, config: &CsvConfig) -> String {
    let formatted = format!("{:.prec$}", value, prec = config.precision);

    if config.decimal_separator != '.' {
        formatted.replace('.', &config.decimal_separator.to_string())
    } else {
        formatted
    }
}

// =================================================================================================
// Exporter
// =================================================================================================

/// Writes replay data as CSV files
#[derive(Debug, Clone, Default)]
pub struct CsvExporter {
    pub config: CsvConfig,
}

impl CsvExporter {
    pub fn new(config: CsvConfig) -> Self {
        Self { config }
    }

    fn create(&self, path: &str) -> Result<BufWriter<File>, CsvError> {
        let mut out = BufWriter::new(File::create(path)?);

        if self.config.include_metadata
            && let Some(metadata) = &self.config.metadata
        {
            write_metadata_header(&mut out, metadata)?;
        }

        Ok(out)
    }

    fn header(&self, out: &mut impl Write, columns: &[&str]) -> Result<(), CsvError> {
        let delimiter = self.config.delimiter.to_string();
        writeln!(out, "{}", columns.join(delimiter.as_str()))?;
        Ok(())
    }

    fn write_snapshot(
        &self,
        out: &mut impl Write,
        droplet: usize,
        state: &DropletSnapshot,
        rows: usize,
    ) -> Result<(), CsvError> {
        let d = self.config.delimiter;
        let values = [
            state.t,
            state.x + 1.0,
            rows as f64 - state.y,
            state.rx,
            state.ry,
            state.opacity,
            state.r,
            state.g,
            state.b,
        ];

        write!(out, "{droplet}")?;
        for value in values {
            write!(out, "{d}{}", format_number(value, &self.config))?;
        }
        writeln!(out)?;
        Ok(())
    }
}

impl Exporter for CsvExporter {
    type Error = CsvError;

    fn export_trajectories(
        &self,
        result: &ReplayResult,
        grid: &GridConfig,
        sample_step: Option<f64>,
        path: &str,
    ) -> Result<(), CsvError> {
        if result.droplets.is_empty() {
            return Err(CsvError::EmptyData("the replay produced no droplet"));
        }
        if let Some(step) = sample_step
            && !(step.is_finite() && step > 0.0)
        {
            return Err(CsvError::InvalidSampleStep(step));
        }

        let mut out = self.create(path)?;
        self.header(&mut out, &["droplet", "t", "x", "y", "rx", "ry", "opacity", "r", "g", "b"])?;

        let rows = grid.rows();
        match sample_step {
            None => {
                for droplet in &result.droplets {
                    for frame in droplet.keyframes() {
                        self.write_snapshot(&mut out, droplet.id, &DropletSnapshot::from(frame), rows)?;
                    }
                }
            }
            Some(step) => {
                let start = result.min_time_ms as f64 / 1000.0;
                let samples = (result.duration_secs() / step).floor() as usize;

                for droplet in &result.droplets {
                    for i in 0..=samples {
                        if let Some(state) = droplet.state_at(start + i as f64 * step) {
                            self.write_snapshot(&mut out, droplet.id, &state, rows)?;
                        }
                    }
                }
            }
        }

        out.flush()?;
        log::debug!("exported {} droplet trajectories to {path}", result.droplets.len());
        Ok(())
    }

    fn export_contamination(&self, log: &ContaminationLog, grid: &GridConfig, path: &str) -> Result<(), CsvError> {
        if log.is_empty() {
            return Err(CsvError::EmptyData("no contamination record"));
        }

        let mut out = self.create(path)?;
        self.header(&mut out, &["time", "droplet", "x", "y"])?;

        let d = self.config.delimiter;
        for record in log.records() {
            let (x, y) = record.cell.script_coords(grid.rows());
            writeln!(out, "{}{d}{}{d}{x}{d}{y}", record.time, record.droplet)?;
        }

        out.flush()?;
        Ok(())
    }

    fn export_route(&self, route: &WashRoute, grid: &GridConfig, path: &str) -> Result<(), CsvError> {
        if route.is_empty() {
            return Err(CsvError::EmptyData("the wash route has no step"));
        }

        let mut out = self.create(path)?;
        self.header(&mut out, &["step", "x", "y"])?;

        let d = self.config.delimiter;
        for (step, pos) in route.steps().iter().enumerate() {
            let (x, y) = pos.script_coords(grid.rows());
            writeln!(out, "{step}{d}{x}{d}{y}")?;
        }

        out.flush()?;
        Ok(())
    }
}

// =================================================================================================
// Tests
// =================================================================================================
