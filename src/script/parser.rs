//! Script compiler
//!
//! One instruction per line. Fields are separated by whitespace, `,` or `;`
//! and the keyword is case-insensitive:
//!
//! ```text
//! input  t, x, y
//! output t, x, y
//! move   t, x1, y1, x2, y2
//! mix    t, x1, y1, x2, y2, ..., xn, yn
//! merge  t, x1, y1, x2, y2
//! split  t, x1, y1, x2, y2, x3, y3
//! ```
//!
//! Coordinates are 1-based with `y` counted from the bottom row.

use crate::chip::{GridConfig, Position};
use crate::error::{ParseError, ParseErrorKind};
use crate::script::command::{Command, CommandList};

/// Largest accepted script time, in seconds, in either direction
///
/// Derived timestamps (`t - 1`, `t + 1`, `t * 1000` milliseconds) stay exact
/// in both `i64` and `f64` within this range.
pub const TIME_LIMIT: i64 = 1_000_000_000_000;

/// Compile a script into replay order
///
/// Stops at the first malformed line.
///
/// # Example
///
/// ```rust
/// use dmfb_rs::chip::{Edge, GridConfig, PortType};
/// use dmfb_rs::script::compile;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let grid = GridConfig::new(8, 8)?
///     .with_port(Edge::Left, 0, PortType::Input)?
///     .with_port(Edge::Top, 1, PortType::Output)?;
///
/// let commands = compile("input 0,1,8\nmerge 4;1,8;3,8\n", &grid)?;
/// assert_eq!(commands.len(), 3);
/// # Ok(())
/// # }
/// ```
pub fn compile(script: &str, grid: &GridConfig) -> Result<CommandList, ParseError> {
    let mut commands = Vec::new();

    for (index, raw) in script.lines().enumerate() {
        let line = index + 1;
        let tokens = tokenize(raw);
        if tokens.is_empty() {
            continue;
        }

        let parsed = LineParser { grid, tokens: &tokens }
            .parse()
            .map_err(|kind| ParseError::new(line, kind))?;

        commands.extend(parsed);
    }

    log::debug!("compiled {} commands", commands.len());
    Ok(CommandList::new(commands))
}

fn checked_time(time: i64) -> Result<i64, ParseErrorKind> {
    if (-TIME_LIMIT..=TIME_LIMIT).contains(&time) {
        Ok(time)
    } else {
        Err(ParseErrorKind::TimeOutOfRange(time))
    }
}

fn tokenize(line: &str) -> Vec<String> {
    line.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

struct LineParser<'a> {
    grid: &'a GridConfig,
    tokens: &'a [String],
}

impl LineParser<'_> {
    fn parse(&self) -> Result<Vec<Command>, ParseErrorKind> {
        match self.tokens[0].as_str() {
            "input" => {
                self.arity("input", "3", 4)?;
                Ok(vec![Command::Input { time: self.time()?, at: self.cell(2)? }])
            }
            "output" => {
                self.arity("output", "3", 4)?;
                Ok(vec![Command::Output { time: self.time()?, at: self.cell(2)? }])
            }
            "move" => {
                self.arity("move", "5", 6)?;
                Ok(vec![Command::Move {
                    time: self.time()?,
                    from: self.cell(2)?,
                    to: self.cell(4)?,
                }])
            }
            "mix" => self.mix(),
            "merge" => self.merge(),
            "split" => self.split(),
            other => Err(ParseErrorKind::UnknownKeyword(other.to_string())),
        }
    }

    fn arity(&self, keyword: &'static str, expected: &'static str, tokens: usize) -> Result<(), ParseErrorKind> {
        if self.tokens.len() == tokens {
            Ok(())
        } else {
            Err(ParseErrorKind::WrongArity {
                keyword,
                expected,
                actual: self.tokens.len() - 1,
            })
        }
    }

    fn number(&self, index: usize) -> Result<i64, ParseErrorKind> {
        let token = &self.tokens[index];
        token
            .parse()
            .map_err(|_| ParseErrorKind::InvalidNumber(token.clone()))
    }

    fn time(&self) -> Result<i64, ParseErrorKind> {
        checked_time(self.number(1)?)
    }

    /// Script coordinate pair starting at `index`, converted to a chip cell
    fn cell(&self, index: usize) -> Result<Position, ParseErrorKind> {
        let (x, y) = (self.number(index)?, self.number(index + 1)?);
        let (columns, rows) = (self.grid.columns(), self.grid.rows());

        if x < 1 || y < 1 || x > columns as i64 || y > rows as i64 {
            return Err(ParseErrorKind::CoordinateOutOfRange { x, y, columns, rows });
        }
        Ok(self.grid.script_position(x, y))
    }

    fn mix(&self) -> Result<Vec<Command>, ParseErrorKind> {
        let len = self.tokens.len();
        if len < 6 || len % 2 != 0 {
            return Err(ParseErrorKind::WrongArity {
                keyword: "mix",
                expected: "a time and at least two waypoints",
                actual: len - 1,
            });
        }

        let start = self.time()?;
        let waypoints = (2..len)
            .step_by(2)
            .map(|index| self.cell(index))
            .collect::<Result<Vec<_>, _>>()?;
        checked_time(start.saturating_add(waypoints.len() as i64))?;

        Ok(waypoints
            .windows(2)
            .zip(start..)
            .map(|(leg, time)| Command::MixStep { time, from: leg[0], to: leg[1] })
            .collect())
    }

    fn merge(&self) -> Result<Vec<Command>, ParseErrorKind> {
        self.arity("merge", "5", 6)?;
        let time = self.time()?;
        let (first, second) = (self.cell(2)?, self.cell(4)?);
        if first == second {
            return Err(ParseErrorKind::DegenerateMerge);
        }

        // Coordinates are non-negative here, so integer division floors
        let target = Position::new((first.x + second.x) / 2, (first.y + second.y) / 2);

        Ok(vec![
            Command::MergeStart { time, first, second, target },
            Command::MergeEnd { time: time + 1, first, second, target },
        ])
    }

    fn split(&self) -> Result<Vec<Command>, ParseErrorKind> {
        self.arity("split", "7", 8)?;
        let time = self.time()?;
        let (source, first, second) = (self.cell(2)?, self.cell(4)?, self.cell(6)?);
        if first == second {
            return Err(ParseErrorKind::DegenerateSplit);
        }

        Ok(vec![
            Command::SplitStart { time, source, first, second },
            Command::SplitEnd { time: time + 1, source, first, second },
        ])
    }
}

// =================================================================================================
// Tests
// =================================================================================================
