//! Primitive commands produced by the compiler

use crate::chip::Position;

/// A primitive, time-stamped chip operation
///
/// `merge` and `split` are staged over two consecutive ticks, and `mix`
/// becomes a chain of single-cell [`Command::MixStep`]s, so every variant
/// here is applied within a single timestamp batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Dispense a droplet beside an input port
    Input { time: i64, at: Position },

    /// Send the droplet beside the output port off the chip
    Output { time: i64, at: Position },

    /// Move a droplet by one step
    Move { time: i64, from: Position, to: Position },

    /// One leg of a `mix` chain
    MixStep { time: i64, from: Position, to: Position },

    /// Two droplets start coalescing towards `target`
    MergeStart {
        time: i64,
        first: Position,
        second: Position,
        target: Position,
    },

    /// The coalesced droplet settles on `target`
    MergeEnd {
        time: i64,
        first: Position,
        second: Position,
        target: Position,
    },

    /// A droplet stretches across `first` and `second`
    SplitStart {
        time: i64,
        source: Position,
        first: Position,
        second: Position,
    },

    /// The stretched droplet breaks into two
    SplitEnd {
        time: i64,
        source: Position,
        first: Position,
        second: Position,
    },
}

impl Command {
    /// Timestamp in seconds
    pub fn time(&self) -> i64 {
        match *self {
            Command::Input { time, .. }
            | Command::Output { time, .. }
            | Command::Move { time, .. }
            | Command::MixStep { time, .. }
            | Command::MergeStart { time, .. }
            | Command::MergeEnd { time, .. }
            | Command::SplitStart { time, .. }
            | Command::SplitEnd { time, .. } => time,
        }
    }

    /// Script keyword the command came from
    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Input { .. } => "input",
            Command::Output { .. } => "output",
            Command::Move { .. } => "move",
            Command::MixStep { .. } => "mix",
            Command::MergeStart { .. } | Command::MergeEnd { .. } => "merge",
            Command::SplitStart { .. } | Command::SplitEnd { .. } => "split",
        }
    }
}

/// Commands in replay order
///
/// Ascending timestamp, ties kept in script order. Immutable once compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandList {
    commands: Vec<Command>,
}

impl CommandList {
    /// Build from commands in script order
    pub fn new(mut commands: Vec<Command>) -> Self {
        // `sort_by_key` is stable: same-tick commands keep their script order
        commands.sort_by_key(Command::time);
        Self { commands }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Command> {
        self.commands.iter()
    }

    pub fn as_slice(&self) -> &[Command] {
        &self.commands
    }

    /// Consecutive runs of commands sharing a timestamp
    pub fn batches(&self) -> impl Iterator<Item = &[Command]> {
        self.commands.chunk_by(|a, b| a.time() == b.time())
    }

    /// Timestamp of the last command
    pub fn last_time(&self) -> Option<i64> {
        self.commands.last().map(Command::time)
    }
}

impl<'a> IntoIterator for &'a CommandList {
    type Item = &'a Command;
    type IntoIter = std::slice::Iter<'a, Command>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}
