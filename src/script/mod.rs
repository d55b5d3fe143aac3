//! Command scripts
//!
//! Compiles the line-oriented script language into a [`CommandList`] of
//! primitive, time-stamped commands:
//!
//! - `merge` expands into [`Command::MergeStart`] at `t` and
//!   [`Command::MergeEnd`] at `t + 1`
//! - `split` expands into [`Command::SplitStart`] at `t` and
//!   [`Command::SplitEnd`] at `t + 1`
//! - `mix` becomes one [`Command::MixStep`] per leg, one second apart
//!
//! The list is sorted by timestamp; commands sharing a timestamp keep the
//! order in which they appear in the script.

mod command;
mod parser;

pub use command::{Command, CommandList};
pub use parser::{compile, TIME_LIMIT};
