//! Droplet occupancy during replay
//!
//! Owned by a single replay call. Cells vacated by a command are only
//! scheduled for release; the builder drains the schedule once every command
//! of the current timestamp has been applied, so the grid changes atomically
//! between ticks.

use std::collections::BTreeSet;

use ndarray::Array2;

use crate::chip::{GridConfig, Position};
use crate::replay::config::SpacingMode;
use crate::replay::droplet::DropletId;

#[derive(Debug, Clone)]
pub(crate) struct OccupancyMap {
    cells: Array2<Option<DropletId>>,
    pending_release: BTreeSet<Position>,
}

impl OccupancyMap {
    pub fn new(grid: &GridConfig) -> Self {
        Self {
            cells: Array2::from_elem((grid.rows(), grid.columns()), None),
            pending_release: BTreeSet::new(),
        }
    }

    fn index(&self, pos: Position) -> Option<[usize; 2]> {
        let (rows, columns) = self.cells.dim();
        (pos.x >= 0 && pos.y >= 0 && (pos.y as usize) < rows && (pos.x as usize) < columns)
            .then(|| [pos.y as usize, pos.x as usize])
    }

    /// Droplet parked on a cell
    pub fn occupant(&self, pos: Position) -> Option<DropletId> {
        self.index(pos).and_then(|index| self.cells[index])
    }

    /// True if `id` may rest on `pos` without breaking the separation rule
    pub fn can_place(&self, pos: Position, id: DropletId, mode: SpacingMode) -> bool {
        let foreign = |cell: Position| self.occupant(cell).is_some_and(|other| other != id);

        match mode {
            SpacingMode::Strict => !foreign(pos) && !pos.neighbours_8().any(foreign),
            SpacingMode::Relaxed => !foreign(pos),
        }
    }

    /// Park `id` on `pos`, cancelling a pending release of that cell
    pub fn place(&mut self, pos: Position, id: DropletId) {
        if let Some(index) = self.index(pos) {
            self.cells[index] = Some(id);
            self.pending_release.remove(&pos);
        }
    }

    /// Vacate a cell immediately
    pub fn remove(&mut self, pos: Position) {
        if let Some(index) = self.index(pos) {
            self.cells[index] = None;
        }
    }

    /// Vacate a cell once the current timestamp batch is complete
    pub fn schedule_release(&mut self, pos: Position) {
        self.pending_release.insert(pos);
    }

    /// Vacate every scheduled cell
    pub fn drain_pending(&mut self) {
        for pos in std::mem::take(&mut self.pending_release) {
            self.remove(pos);
        }
    }

    /// Number of occupied cells
    #[cfg(test)]
    pub fn occupied(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }
}
