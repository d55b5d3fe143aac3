//! Contamination tracking
//!
//! Replay emits one [`ContaminationRecord`] every time a droplet settles on a
//! cell. The records form a time-sorted [`ContaminationLog`]; what is dirty
//! *so far* depends on the playback position, so the per-cell view
//! ([`ContaminationMap`]) is folded on the consumer side as the display clock
//! advances and is cleaned again by wash routes.
//!
//! # Example
//!
//! ```rust
//! use dmfb_rs::chip::{GridConfig, Position};
//! use dmfb_rs::contamination::{ContaminationLog, ContaminationMap, ContaminationRecord};
//!
//! # fn main() -> Result<(), dmfb_rs::error::ConfigError> {
//! let grid = GridConfig::new(5, 5)?;
//! let log = ContaminationLog::new(vec![
//!     ContaminationRecord::new(3, 1, Position::new(2, 2)),
//!     ContaminationRecord::new(1, 0, Position::new(0, 1)),
//! ]);
//!
//! let mut map = ContaminationMap::new(&grid);
//! map.apply_all(log.between(0, 2000));
//!
//! assert!(map.is_contaminated(Position::new(0, 1)));
//! assert!(!map.is_contaminated(Position::new(2, 2)));
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeSet;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::chip::{GridConfig, Position};
use crate::replay::DropletId;

/// A droplet touched a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContaminationRecord {
    /// Time of contact, in seconds
    pub time: i64,
    pub droplet: DropletId,
    pub cell: Position,
}

impl ContaminationRecord {
    pub fn new(time: i64, droplet: DropletId, cell: Position) -> Self {
        Self { time, droplet, cell }
    }

    fn time_ms(&self) -> i64 {
        self.time.saturating_mul(1000)
    }
}

/// Contamination records in time order, ties in emission order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContaminationLog {
    records: Vec<ContaminationRecord>,
}

impl ContaminationLog {
    pub fn new(mut records: Vec<ContaminationRecord>) -> Self {
        records.sort_by_key(|record| record.time);
        Self { records }
    }

    pub fn records(&self) -> &[ContaminationRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn lower_bound(&self, ms: i64) -> usize {
        self.records.partition_point(|record| record.time_ms() < ms)
    }

    /// Records whose time falls in `[from_ms, to_ms)`
    pub fn between(&self, from_ms: i64, to_ms: i64) -> &[ContaminationRecord] {
        let start = self.lower_bound(from_ms);
        let end = self.lower_bound(to_ms).max(start);
        &self.records[start..end]
    }

    /// Records stamped exactly at `second`
    pub fn at(&self, second: i64) -> &[ContaminationRecord] {
        let ms = second.saturating_mul(1000);
        self.between(ms, ms.saturating_add(1))
    }

    /// Records strictly before `to_ms`
    pub fn until(&self, to_ms: i64) -> &[ContaminationRecord] {
        &self.records[..self.lower_bound(to_ms)]
    }
}

/// Droplets that have touched each cell and not been washed away
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContaminationMap {
    cells: Array2<BTreeSet<DropletId>>,
}

impl ContaminationMap {
    /// Clean chip
    pub fn new(grid: &GridConfig) -> Self {
        Self {
            cells: Array2::from_elem((grid.rows(), grid.columns()), BTreeSet::new()),
        }
    }

    fn index(&self, pos: Position) -> Option<[usize; 2]> {
        let (rows, columns) = self.cells.dim();
        (pos.x >= 0 && pos.y >= 0 && (pos.y as usize) < rows && (pos.x as usize) < columns)
            .then(|| [pos.y as usize, pos.x as usize])
    }

    /// Fold one record; off-chip cells are ignored
    pub fn apply(&mut self, record: &ContaminationRecord) {
        if let Some(index) = self.index(record.cell) {
            self.cells[index].insert(record.droplet);
        }
    }

    pub fn apply_all<'a>(&mut self, records: impl IntoIterator<Item = &'a ContaminationRecord>) {
        for record in records {
            self.apply(record);
        }
    }

    /// Droplets that left residue on a cell
    pub fn droplets_at(&self, pos: Position) -> Option<&BTreeSet<DropletId>> {
        self.index(pos).map(|index| &self.cells[index])
    }

    pub fn is_contaminated(&self, pos: Position) -> bool {
        self.droplets_at(pos).is_some_and(|set| !set.is_empty())
    }

    /// Wash a single cell
    pub fn clean(&mut self, pos: Position) {
        if let Some(index) = self.index(pos) {
            self.cells[index].clear();
        }
    }

    /// Wash every on-chip cell of a route
    pub fn clean_route(&mut self, steps: &[Position]) {
        for &pos in steps {
            self.clean(pos);
        }
    }

    /// Wash everything
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(BTreeSet::clear);
    }

    /// Contaminated cells in row-major order
    pub fn contaminated_cells(&self) -> Vec<Position> {
        self.cells
            .indexed_iter()
            .filter(|(_, set)| !set.is_empty())
            .map(|((row, column), _)| Position::new(column as i32, row as i32))
            .collect()
    }

    /// Number of (cell, droplet) residue pairs
    pub fn residue_count(&self) -> usize {
        self.cells.iter().map(BTreeSet::len).sum()
    }
}

// =================================================================================================
// Tests
// =================================================================================================
