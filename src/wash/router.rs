//! Contamination-aware wash routing
//!
//! The cleaning droplet enters through the wash port and must leave through
//! the waste port after visiting every reachable contaminated cell.
//!
//! # Algorithm
//!
//! 1. A BFS from the wash port cell explores the free cells (4-connected).
//!    The first time it reaches a contaminated cell, the shortest path from
//!    the current end of the route to that cell is spliced into the route,
//!    and the cell is pushed to the *front* of the queue so that its
//!    surroundings are explored next.
//! 2. Once the BFS is exhausted, the shortest path from the end of the
//!    route to the waste port is appended, followed by the waste staging
//!    cell.
//!
//! Every splice uses a fresh point-to-point BFS with parent directions.

use std::collections::VecDeque;

use ndarray::Array2;
use serde::Serialize;

use crate::chip::{GridConfig, PortType, Position, DIRECTIONS_4};
use crate::contamination::ContaminationMap;
use crate::error::WashError;
use crate::replay::easing;
use crate::wash::obstacles::ObstacleMask;

/// Outcome of a successful planning call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WashPlan {
    /// A route through every reachable contaminated cell
    Route(WashRoute),

    /// Nothing is contaminated and the route would be trivial
    NothingToClean,
}

/// Ordered cells visited by the cleaning droplet, one second apart
///
/// Starts at the wash port staging cell and ends at the waste port staging
/// cell; both lie off the chip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WashRoute {
    steps: Vec<Position>,
}

impl WashRoute {
    pub fn steps(&self) -> &[Position] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Seconds from leaving the wash staging cell to reaching the waste one
    pub fn duration_secs(&self) -> f64 {
        self.steps.len().saturating_sub(1) as f64
    }

    /// Eased position of the cleaning droplet `t` seconds into the wash
    ///
    /// Clamped to the first and last steps outside `[0, duration]`.
    pub fn position_at(&self, t: f64) -> Option<(f64, f64)> {
        let first = self.steps.first()?;
        let last = self.steps.last()?;

        if t <= 0.0 {
            return Some((f64::from(first.x), f64::from(first.y)));
        }
        if t >= self.duration_secs() {
            return Some((f64::from(last.x), f64::from(last.y)));
        }

        let index = t.floor() as usize;
        let p = easing(t - index as f64);
        let (a, b) = (self.steps[index], self.steps[index + 1]);
        Some((
            f64::from(a.x) + f64::from(b.x - a.x) * p,
            f64::from(a.y) + f64::from(b.y - a.y) * p,
        ))
    }

    /// True if the route passes through `pos`
    pub fn visits(&self, pos: Position) -> bool {
        self.steps.contains(&pos)
    }

    /// Cells on the chip, in visiting order
    pub fn on_chip<'a>(&'a self, grid: &'a GridConfig) -> impl Iterator<Item = Position> + 'a {
        self.steps.iter().copied().filter(move |&pos| grid.contains(pos))
    }
}

/// Plans wash routes on one chip
///
/// # Example
///
/// ```rust
/// use dmfb_rs::chip::{Edge, GridConfig, PortType, Position};
/// use dmfb_rs::contamination::{ContaminationMap, ContaminationRecord};
/// use dmfb_rs::wash::{ObstacleMask, WashPlan, WashRouter};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let grid = GridConfig::with_default_ports(6, 6)?
///     .with_port(Edge::Left, 1, PortType::Input)?
///     .with_port(Edge::Right, 3, PortType::Output)?;
///
/// let mut dirty = ContaminationMap::new(&grid);
/// dirty.apply(&ContaminationRecord::new(0, 0, Position::new(2, 2)));
///
/// let plan = WashRouter::new(&grid).plan(&ObstacleMask::new(&grid), &dirty)?;
/// match plan {
///     WashPlan::Route(route) => assert!(route.visits(Position::new(2, 2))),
///     WashPlan::NothingToClean => unreachable!(),
/// }
/// # Ok(())
/// # }
/// ```
pub struct WashRouter<'g> {
    grid: &'g GridConfig,
}

impl<'g> WashRouter<'g> {
    pub fn new(grid: &'g GridConfig) -> Self {
        Self { grid }
    }

    /// Plan a route through every reachable contaminated cell
    ///
    /// # Errors
    ///
    /// - [`WashError::NoWashPort`] if the chip has no wash or no waste port
    /// - [`WashError::NoRoute`] if either port cell is blocked or the waste
    ///   port cannot be reached
    pub fn plan(&self, obstacles: &ObstacleMask, contamination: &ContaminationMap) -> Result<WashPlan, WashError> {
        let (Some(source), Some(target)) = (
            self.grid.ports(PortType::Wash).next(),
            self.grid.ports(PortType::Waste).next(),
        ) else {
            log::warn!("wash requested on a chip without wash/waste ports");
            return Err(WashError::NoWashPort);
        };

        if obstacles.is_blocked(source) || obstacles.is_blocked(target) {
            log::warn!("wash port {source} or waste port {target} is blocked");
            return Err(WashError::NoRoute);
        }

        let mut steps = vec![self.grid.staging_cell(source), source];
        let mut distance = self.grid_of(-1i32);
        let mut washed = self.grid_of(false);
        let mut queue = VecDeque::from([source]);
        distance[self.index(source)] = 0;

        while let Some(pos) = queue.pop_front() {
            let next_distance = distance[self.index(pos)] + 1;

            for neighbour in pos.neighbours_4() {
                if !self.grid.contains(neighbour) || obstacles.is_blocked(neighbour) {
                    continue;
                }

                let index = self.index(neighbour);
                if distance[index] != -1 && distance[index] <= next_distance {
                    continue;
                }
                distance[index] = next_distance;

                if contamination.is_contaminated(neighbour) && !washed[index] {
                    self.splice(&mut steps, neighbour, obstacles)?;
                    log::debug!("wash detour to {neighbour}, route now {} steps", steps.len());
                    washed[index] = true;
                    queue.push_front(neighbour);
                } else {
                    queue.push_back(neighbour);
                }
            }
        }

        if distance[self.index(target)] == -1 {
            log::warn!("waste port {target} unreachable from wash port {source}");
            return Err(WashError::NoRoute);
        }

        if steps.len() <= 2 && !contamination.is_contaminated(source) {
            log::info!("nothing to wash");
            return Ok(WashPlan::NothingToClean);
        }

        self.splice(&mut steps, target, obstacles)?;
        steps.push(self.grid.staging_cell(target));

        log::info!("wash route planned: {} steps", steps.len());
        Ok(WashPlan::Route(WashRoute { steps }))
    }

    fn grid_of<T: Clone>(&self, value: T) -> Array2<T> {
        Array2::from_elem((self.grid.rows(), self.grid.columns()), value)
    }

    fn index(&self, pos: Position) -> [usize; 2] {
        [pos.y as usize, pos.x as usize]
    }

    /// Append the shortest path from the route tail to `target`
    fn splice(&self, steps: &mut Vec<Position>, target: Position, obstacles: &ObstacleMask) -> Result<(), WashError> {
        let tail = *steps.last().ok_or(WashError::NoRoute)?;
        let path = self.shortest_path(tail, target, obstacles).ok_or(WashError::NoRoute)?;
        steps.extend(path);
        Ok(())
    }

    /// Shortest 4-connected path, excluding `from` and including `to`
    fn shortest_path(&self, from: Position, to: Position, obstacles: &ObstacleMask) -> Option<Vec<Position>> {
        if from == to {
            return Some(Vec::new());
        }

        let mut parent: Array2<Option<usize>> = self.grid_of(None);
        let mut seen = self.grid_of(false);
        let mut queue = VecDeque::from([from]);
        seen[self.index(from)] = true;

        'search: while let Some(pos) = queue.pop_front() {
            for (direction, (dx, dy)) in DIRECTIONS_4.into_iter().enumerate() {
                let next = pos.offset(dx, dy);
                if !self.grid.contains(next) || obstacles.is_blocked(next) || seen[self.index(next)] {
                    continue;
                }

                seen[self.index(next)] = true;
                parent[self.index(next)] = Some(direction);
                if next == to {
                    break 'search;
                }
                queue.push_back(next);
            }
        }

        let mut path = Vec::new();
        let mut cursor = to;
        while cursor != from {
            let direction = parent[self.index(cursor)]?;
            path.push(cursor);
            let (dx, dy) = DIRECTIONS_4[direction];
            cursor = cursor.offset(-dx, -dy);
        }
        path.reverse();
        Some(path)
    }
}

// =================================================================================================
// Tests
// =================================================================================================
