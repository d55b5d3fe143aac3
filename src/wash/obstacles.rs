//! Obstacle mask for wash routing
//!
//! Two sources of obstacles are combined:
//!
//! 1. cells painted by the user, toggled one at a time; wash and waste port
//!    cells can never be painted
//! 2. a snapshot of the droplets visible at the current display time, each
//!    covering its elliptical footprint grown by one cell in every direction

use ndarray::Array2;

use crate::chip::{GridConfig, PortType, Position};
use crate::replay::Droplet;

/// Cells the cleaning droplet must avoid
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObstacleMask {
    cells: Array2<bool>,
}

impl ObstacleMask {
    /// Mask with no obstacle
    pub fn new(grid: &GridConfig) -> Self {
        Self {
            cells: Array2::from_elem((grid.rows(), grid.columns()), false),
        }
    }

    fn index(&self, pos: Position) -> Option<[usize; 2]> {
        let (rows, columns) = self.cells.dim();
        (pos.x >= 0 && pos.y >= 0 && (pos.y as usize) < rows && (pos.x as usize) < columns)
            .then(|| [pos.y as usize, pos.x as usize])
    }

    /// Flip a painted cell and return its new state
    ///
    /// Wash and waste port cells are always cleared instead; off-chip cells
    /// are ignored.
    pub fn toggle(&mut self, grid: &GridConfig, pos: Position) -> bool {
        let Some(index) = self.index(pos) else {
            return false;
        };

        let reserved = grid.is_port_type(pos, PortType::Wash) || grid.is_port_type(pos, PortType::Waste);
        self.cells[index] = !reserved && !self.cells[index];
        self.cells[index]
    }

    /// Mark a cell as blocked; off-chip cells are ignored
    pub fn block(&mut self, pos: Position) {
        if let Some(index) = self.index(pos) {
            self.cells[index] = true;
        }
    }

    /// Off-chip cells count as blocked
    pub fn is_blocked(&self, pos: Position) -> bool {
        self.index(pos).is_none_or(|index| self.cells[index])
    }

    pub fn blocked_cells(&self) -> Vec<Position> {
        self.cells
            .indexed_iter()
            .filter(|(_, blocked)| **blocked)
            .map(|((row, column), _)| Position::new(column as i32, row as i32))
            .collect()
    }

    pub fn clear(&mut self) {
        self.cells.fill(false);
    }

    /// This mask plus every droplet visible at `t` seconds
    ///
    /// A droplet centred on `(x, y)` with half-extents `(rx, ry)` covers the
    /// cells `ceil(x - rx)..=floor(x + rx)` by `ceil(y - ry)..=floor(y + ry)`
    /// and the cell under its truncated centre; each covered cell also
    /// blocks its 8 neighbours. Fully transparent droplets have already left
    /// the chip and block nothing.
    pub fn with_droplets(&self, droplets: &[Droplet], t: f64) -> Self {
        let mut mask = self.clone();

        let visible = droplets
            .iter()
            .filter_map(|droplet| droplet.state_at(t))
            .filter(|state| state.opacity > 0.0);

        for state in visible {
            let (x0, x1) = ((state.x - state.rx).ceil() as i32, (state.x + state.rx).floor() as i32);
            let (y0, y1) = ((state.y - state.ry).ceil() as i32, (state.y + state.ry).floor() as i32);

            let footprint = (x0..=x1)
                .flat_map(|x| (y0..=y1).map(move |y| Position::new(x, y)))
                .chain(std::iter::once(state.cell()));

            for cell in footprint {
                mask.block(cell);
                cell.neighbours_8().for_each(|neighbour| mask.block(neighbour));
            }
        }

        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::Edge;
    use crate::replay::{Color, Keyframe, RADIUS};

    fn grid() -> GridConfig {
        GridConfig::with_default_ports(6, 6)
            .unwrap()
            .with_port(Edge::Left, 1, PortType::Input)
            .unwrap()
            .with_port(Edge::Right, 3, PortType::Output)
            .unwrap()
    }

    #[test]
    fn test_toggle_flips() {
        let grid = grid();
        let mut mask = ObstacleMask::new(&grid);
        assert!(mask.toggle(&grid, Position::new(2, 2)));
        assert!(mask.is_blocked(Position::new(2, 2)));
        assert!(!mask.toggle(&grid, Position::new(2, 2)));
        assert!(!mask.is_blocked(Position::new(2, 2)));
    }

    #[test]
    fn test_wash_and_waste_cells_cannot_be_painted() {
        let grid = grid();
        let mut mask = ObstacleMask::new(&grid);
        // bottom[0] is wash, top[5] is waste
        assert!(!mask.toggle(&grid, Position::new(0, 5)));
        assert!(!mask.toggle(&grid, Position::new(5, 0)));
        assert!(mask.blocked_cells().is_empty());
    }

    #[test]
    fn test_off_chip_is_blocked() {
        let mask = ObstacleMask::new(&grid());
        assert!(mask.is_blocked(Position::new(-1, 0)));
        assert!(mask.is_blocked(Position::new(0, 6)));
    }

    #[test]
    fn test_resting_droplet_blocks_neighbourhood() {
        let grid = grid();
        let color = Color::new(1, 2, 3);
        let droplet = Droplet::new(
            0,
            vec![
                Keyframe::resting(0.0, Position::new(3, 3), color),
                Keyframe::resting(2.0, Position::new(3, 3), color),
            ],
        );

        let mask = ObstacleMask::new(&grid).with_droplets(&[droplet], 1.0);
        assert_eq!(mask.blocked_cells().len(), 9);
        assert!(mask.is_blocked(Position::new(2, 2)));
        assert!(mask.is_blocked(Position::new(4, 4)));
        assert!(!mask.is_blocked(Position::new(5, 3)));
    }

    #[test]
    fn test_stretched_droplet_widens_footprint() {
        let grid = grid();
        let color = Color::new(1, 2, 3);
        let stretched = Keyframe { rx: 3.0 * RADIUS, ..Keyframe::resting(0.0, Position::new(2, 2), color) };
        let droplet = Droplet::new(0, vec![stretched, stretched.at(2.0, Position::new(2, 2))]);

        let mask = ObstacleMask::new(&grid).with_droplets(&[droplet], 1.0);
        // footprint x in 1..=3, dilated to 0..=4
        assert!(mask.is_blocked(Position::new(0, 2)));
        assert!(mask.is_blocked(Position::new(4, 3)));
        assert!(!mask.is_blocked(Position::new(5, 2)));
    }

    #[test]
    fn test_absent_droplet_ignored() {
        let grid = grid();
        let color = Color::new(1, 2, 3);
        let droplet = Droplet::new(
            0,
            vec![
                Keyframe::resting(5.0, Position::new(3, 3), color),
                Keyframe::resting(6.0, Position::new(3, 3), color),
            ],
        );
        let mask = ObstacleMask::new(&grid).with_droplets(&[droplet], 1.0);
        assert!(mask.blocked_cells().is_empty());
    }

    #[test]
    fn test_vanished_droplet_ignored() {
        let grid = grid();
        let color = Color::new(1, 2, 3);
        let droplet = Droplet::new(
            0,
            vec![
                Keyframe::resting(0.0, Position::new(1, 0), color),
                Keyframe::vanished(1.0, Position::new(1, -1), color),
            ],
        );
        let mask = ObstacleMask::new(&grid).with_droplets(&[droplet], 1.0);
        assert!(mask.blocked_cells().is_empty());
    }
}
