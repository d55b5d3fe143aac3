//! Chip grid and perimeter ports
//!
//! Cells are addressed by [`Position`] with the origin in the top-left corner:
//! `x` is the column, `y` the row. Script coordinates (1-based, `y` measured
//! from the bottom) are converted by the compiler.
//!
//! # Corner ownership
//!
//! Every perimeter cell belongs to exactly one edge entry:
//!
//! ```text
//!        top[1] .. top[C-1]
//!      +--------------------+
//! left |                    | right[1]
//!  [0] |                    |   ..
//!  ..  |                    | right[R-1]
//!  [R-2]+-------------------+
//!        bottom[0] .. bottom[C-2]
//! ```
//!
//! so `left[R-1]`, `top[0]`, `right[0]` and `bottom[C-1]` are never reached.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Smallest accepted number of rows or columns
pub const MIN_DIMENSION: usize = 3;

/// Largest accepted number of rows or columns
pub const MAX_DIMENSION: usize = 12;

// =================================================================================================
// Position
// =================================================================================================

/// 4-connected neighbourhood, in the order used by every BFS of the crate
pub const DIRECTIONS_4: [(i32, i32); 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];

/// 8-connected neighbourhood
pub const DIRECTIONS_8: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// A cell of the chip, or a staging cell just outside it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Column, 0 on the left
    pub x: i32,
    /// Row, 0 on the top
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Neighbouring position shifted by `(dx, dy)`
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// The four orthogonal neighbours (may lie off the chip)
    pub fn neighbours_4(self) -> impl Iterator<Item = Position> {
        DIRECTIONS_4.into_iter().map(move |(dx, dy)| self.offset(dx, dy))
    }

    /// The eight surrounding cells (may lie off the chip)
    pub fn neighbours_8(self) -> impl Iterator<Item = Position> {
        DIRECTIONS_8.into_iter().map(move |(dx, dy)| self.offset(dx, dy))
    }

    /// Manhattan distance
    pub fn manhattan(self, other: Position) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Coordinates as written in a script: 1-based, `y` from the bottom
    pub fn script_coords(self, rows: usize) -> (i64, i64) {
        (i64::from(self.x) + 1, rows as i64 - i64::from(self.y))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// =================================================================================================
// Ports
// =================================================================================================

/// Kind of a perimeter port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortType {
    #[default]
    None,
    Input,
    Output,
    Wash,
    Waste,
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PortType::None => "none",
            PortType::Input => "input",
            PortType::Output => "output",
            PortType::Wash => "wash",
            PortType::Waste => "waste",
        };
        f.write_str(name)
    }
}

/// One of the four chip edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

impl std::fmt::Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Edge::Left => "left",
            Edge::Right => "right",
            Edge::Top => "top",
            Edge::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

// =================================================================================================
// Grid configuration
// =================================================================================================

/// Serialized form of a chip, validated into a [`GridConfig`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChipDescription {
    pub rows: usize,
    pub columns: usize,
    pub left: Vec<PortType>,
    pub right: Vec<PortType>,
    pub top: Vec<PortType>,
    pub bottom: Vec<PortType>,
}

/// Chip dimensions and the port assigned to every perimeter cell
///
/// Built once per session and never mutated while a simulation runs.
///
/// # Example
///
/// ```rust
/// use dmfb_rs::chip::{Edge, GridConfig, PortType, Position};
///
/// # fn main() -> Result<(), dmfb_rs::error::ConfigError> {
/// let grid = GridConfig::new(8, 8)?
///     .with_port(Edge::Left, 0, PortType::Input)?
///     .with_port(Edge::Top, 1, PortType::Output)?;
/// grid.validate()?;
///
/// assert!(grid.is_port_type(Position::new(0, 0), PortType::Input));
/// assert_eq!(grid.staging_cell(Position::new(0, 0)), Position::new(-1, 0));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ChipDescription", into = "ChipDescription")]
pub struct GridConfig {
    rows: usize,
    columns: usize,
    left: Vec<PortType>,
    right: Vec<PortType>,
    top: Vec<PortType>,
    bottom: Vec<PortType>,
}

impl GridConfig {
    /// Create a chip with no ports
    pub fn new(rows: usize, columns: usize) -> Result<Self, ConfigError> {
        let in_range = |n: usize| (MIN_DIMENSION..=MAX_DIMENSION).contains(&n);
        if !in_range(rows) || !in_range(columns) || (rows == MIN_DIMENSION && columns == MIN_DIMENSION) {
            return Err(ConfigError::InvalidDimensions { rows, columns });
        }

        Ok(Self {
            rows,
            columns,
            left: vec![PortType::None; rows],
            right: vec![PortType::None; rows],
            top: vec![PortType::None; columns],
            bottom: vec![PortType::None; columns],
        })
    }

    /// Chip with the wash port on the bottom-left corner and the waste port
    /// on the top-right corner, the layout a fresh chip starts from
    pub fn with_default_ports(rows: usize, columns: usize) -> Result<Self, ConfigError> {
        Self::new(rows, columns)?
            .with_port(Edge::Bottom, 0, PortType::Wash)?
            .with_port(Edge::Top, columns - 1, PortType::Waste)
    }

    /// Builder pattern: assign a port
    pub fn with_port(mut self, edge: Edge, index: usize, port: PortType) -> Result<Self, ConfigError> {
        self.set_port(edge, index, port)?;
        Ok(self)
    }

    /// Assign a port on an edge
    pub fn set_port(&mut self, edge: Edge, index: usize, port: PortType) -> Result<(), ConfigError> {
        let slots = self.edge_mut(edge);
        let length = slots.len();
        match slots.get_mut(index) {
            Some(slot) => {
                *slot = port;
                Ok(())
            }
            None => Err(ConfigError::PortIndex { edge, index, length }),
        }
    }

    /// Parse and validate a JSON chip description
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GridConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Port sequence of an edge
    pub fn edge(&self, edge: Edge) -> &[PortType] {
        match edge {
            Edge::Left => &self.left,
            Edge::Right => &self.right,
            Edge::Top => &self.top,
            Edge::Bottom => &self.bottom,
        }
    }

    fn edge_mut(&mut self, edge: Edge) -> &mut Vec<PortType> {
        match edge {
            Edge::Left => &mut self.left,
            Edge::Right => &mut self.right,
            Edge::Top => &mut self.top,
            Edge::Bottom => &mut self.bottom,
        }
    }

    /// True iff a wash port is configured
    pub fn has_wash(&self) -> bool {
        self.perimeter().any(|pos| self.port_at(pos) == PortType::Wash)
    }

    /// Check port counts
    ///
    /// At least one input, exactly one output, and either no wash/waste
    /// ports at all or wash ports with exactly one waste port.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (edge, index) in [
            (Edge::Left, self.rows - 1),
            (Edge::Top, 0),
            (Edge::Right, 0),
            (Edge::Bottom, self.columns - 1),
        ] {
            let port = self.edge(edge)[index];
            if port != PortType::None {
                return Err(ConfigError::UnreachablePort { edge, index, port });
            }
        }

        let count = |wanted: PortType| {
            self.perimeter()
                .filter(|&pos| self.port_at(pos) == wanted)
                .count()
        };

        let (inputs, outputs) = (count(PortType::Input), count(PortType::Output));
        let (washes, wastes) = (count(PortType::Wash), count(PortType::Waste));

        if inputs == 0 {
            Err(ConfigError::MissingInput)
        } else if outputs != 1 {
            Err(ConfigError::OutputCount(outputs))
        } else if washes == 0 && wastes != 0 {
            Err(ConfigError::WasteWithoutWash)
        } else if washes != 0 && wastes != 1 {
            Err(ConfigError::WasteCount(wastes))
        } else {
            Ok(())
        }
    }

    /// True if the position lies on the chip
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.columns && (pos.y as usize) < self.rows
    }

    /// `[row, column]` index for `ndarray` storage, `None` off the chip
    pub fn cell_index(&self, pos: Position) -> Option<[usize; 2]> {
        self.contains(pos).then(|| [pos.y as usize, pos.x as usize])
    }

    /// All cells, column by column
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.columns as i32).flat_map(move |x| (0..self.rows as i32).map(move |y| Position::new(x, y)))
    }

    /// Perimeter cells, column by column
    pub fn perimeter(&self) -> impl Iterator<Item = Position> + '_ {
        self.cells().filter(move |&pos| self.port_slot(pos).is_some())
    }

    /// Edge entry owning a perimeter cell
    pub fn port_slot(&self, pos: Position) -> Option<(Edge, usize)> {
        if !self.contains(pos) {
            return None;
        }
        let (x, y) = (pos.x as usize, pos.y as usize);
        let (rows, columns) = (self.rows, self.columns);

        if x == 0 && y + 1 < rows {
            Some((Edge::Left, y))
        } else if y + 1 == rows && x + 1 < columns {
            Some((Edge::Bottom, x))
        } else if x + 1 == columns && y > 0 {
            Some((Edge::Right, y))
        } else if y == 0 && x > 0 {
            Some((Edge::Top, x))
        } else {
            None
        }
    }

    /// Port beside a cell (`PortType::None` for interior or off-chip cells)
    pub fn port_at(&self, pos: Position) -> PortType {
        self.port_slot(pos)
            .map(|(edge, index)| self.edge(edge)[index])
            .unwrap_or_default()
    }

    /// True if the cell sits beside a port of the given type
    pub fn is_port_type(&self, pos: Position, port: PortType) -> bool {
        port != PortType::None && self.port_at(pos) == port
    }

    /// Cells beside ports of the given type, column by column
    pub fn ports(&self, port: PortType) -> impl Iterator<Item = Position> + '_ {
        self.perimeter().filter(move |&pos| self.is_port_type(pos, port))
    }

    /// Cell one step outward through the owning edge
    ///
    /// Droplets materialize there before entering and vanish there after
    /// leaving. Interior cells are returned unchanged.
    pub fn staging_cell(&self, pos: Position) -> Position {
        match self.port_slot(pos) {
            Some((Edge::Left, _)) => pos.offset(-1, 0),
            Some((Edge::Bottom, _)) => pos.offset(0, 1),
            Some((Edge::Right, _)) => pos.offset(1, 0),
            Some((Edge::Top, _)) => pos.offset(0, -1),
            None => pos,
        }
    }

    /// Convert 1-based script coordinates (`y` from the bottom)
    pub fn script_position(&self, x: i64, y: i64) -> Position {
        Position::new((x - 1) as i32, (self.rows as i64 - y) as i32)
    }
}

impl TryFrom<ChipDescription> for GridConfig {
    type Error = ConfigError;

    fn try_from(description: ChipDescription) -> Result<Self, Self::Error> {
        let mut config = GridConfig::new(description.rows, description.columns)?;

        for (edge, ports) in [
            (Edge::Left, description.left),
            (Edge::Right, description.right),
            (Edge::Top, description.top),
            (Edge::Bottom, description.bottom),
        ] {
            let expected = config.edge(edge).len();
            if ports.len() != expected {
                return Err(ConfigError::EdgeLength {
                    edge,
                    expected,
                    actual: ports.len(),
                });
            }
            *config.edge_mut(edge) = ports;
        }

        Ok(config)
    }
}

impl From<GridConfig> for ChipDescription {
    fn from(config: GridConfig) -> Self {
        Self {
            rows: config.rows,
            columns: config.columns,
            left: config.left,
            right: config.right,
            top: config.top,
            bottom: config.bottom,
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================
