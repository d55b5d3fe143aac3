//! Error types
//!
//! Every stage of the pipeline has its own error type so that callers can
//! react precisely:
//!
//! | Stage              | Type            | Policy                                   |
//! |--------------------|-----------------|------------------------------------------|
//! | Chip configuration | [`ConfigError`] | rejected before any simulation           |
//! | Script compilation | [`ParseError`]  | fatal, nothing is replayed               |
//! | Replay             | [`ReplayError`] | recorded in the result, replay may halt  |
//! | Wash routing       | [`WashError`]   | returned to the caller, no partial route |
//!
//! [`SessionError`] wraps the first two for [`Session::load`](crate::session::Session::load).

use serde::Serialize;
use thiserror::Error;

use crate::chip::{Edge, PortType};

// =================================================================================================
// Chip configuration
// =================================================================================================

/// Invalid chip description
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("chip dimensions {rows}x{columns} are invalid: rows and columns must be within 3..=12 and not both 3")]
    InvalidDimensions { rows: usize, columns: usize },

    #[error("{edge} edge has {actual} ports, expected {expected}")]
    EdgeLength { edge: Edge, expected: usize, actual: usize },

    #[error("port index {index} is outside the {edge} edge (length {length})")]
    PortIndex { edge: Edge, index: usize, length: usize },

    #[error("{edge}[{index}] is set to {port} but no perimeter cell maps to it")]
    UnreachablePort { edge: Edge, index: usize, port: PortType },

    #[error("please specify at least one input port")]
    MissingInput,

    #[error("please specify exactly one output port, found {0}")]
    OutputCount(usize),

    #[error("waste port is not allowed without a wash input port")]
    WasteWithoutWash,

    #[error("please specify exactly one waste port with the wash input port, found {0}")]
    WasteCount(usize),

    #[error("malformed chip description: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Malformed(err.to_string())
    }
}

// =================================================================================================
// Script compilation
// =================================================================================================

/// Reason a script line was rejected
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("unrecognized command `{0}`")]
    UnknownKeyword(String),

    #[error("`{keyword}` expects {expected} fields, got {actual}")]
    WrongArity {
        keyword: &'static str,
        expected: &'static str,
        actual: usize,
    },

    #[error("`{0}` is not an integer")]
    InvalidNumber(String),

    #[error("time {0} lies outside ±{limit} s", limit = crate::script::TIME_LIMIT)]
    TimeOutOfRange(i64),

    #[error("coordinate ({x}, {y}) lies outside the {columns}x{rows} chip")]
    CoordinateOutOfRange {
        x: i64,
        y: i64,
        columns: usize,
        rows: usize,
    },

    #[error("merge needs two distinct source cells")]
    DegenerateMerge,

    #[error("split needs two distinct destination cells")]
    DegenerateSplit,
}

/// A malformed script line, with its 1-based line number
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, kind: ParseErrorKind) -> Self {
        Self { line, kind }
    }
}

// =================================================================================================
// Replay
// =================================================================================================

/// Category of a replay violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReplayErrorKind {
    /// Operation at a cell that is not beside the required port type
    PortMismatch,
    /// Referenced source cell holds no droplet
    NoDropletHere,
    /// Minimum separation between distinct droplets broken
    SpacingViolation,
}

impl std::fmt::Display for ReplayErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReplayErrorKind::PortMismatch => "port mismatch",
            ReplayErrorKind::NoDropletHere => "no droplet here",
            ReplayErrorKind::SpacingViolation => "spacing violation",
        };
        f.write_str(name)
    }
}

/// A constraint violation raised while replaying a command
///
/// `time` is the timestamp of the offending command (seconds).
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize)]
#[error("{message}")]
pub struct ReplayError {
    pub time: i64,
    pub kind: ReplayErrorKind,
    pub message: String,
}

impl ReplayError {
    pub fn new(time: i64, kind: ReplayErrorKind, message: impl Into<String>) -> Self {
        Self {
            time,
            kind,
            message: message.into(),
        }
    }
}

// =================================================================================================
// Wash routing
// =================================================================================================

/// Wash route planning failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WashError {
    #[error("cannot wash the chip: no wash input or waste port configured")]
    NoWashPort,

    #[error("cannot wash the chip: no valid route")]
    NoRoute,
}

// =================================================================================================
// Session
// =================================================================================================

/// Failure to load a chip and script into a playback session
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid chip: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid script: {0}")]
    Parse(#[from] ParseError),
}
