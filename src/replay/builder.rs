//! Trajectory builder
//!
//! Replays a [`CommandList`] against a live occupancy map and emits one
//! keyframed trajectory per droplet, together with the sound cues, the
//! contamination records and the constraint violations met on the way.
//!
//! # Timestamp batches
//!
//! All commands sharing a timestamp are applied before any cell they vacate
//! is actually released. A droplet leaving a cell at `t` therefore still
//! blocks that cell for every other command stamped `t`.
//!
//! # Validation
//!
//! Each command checks every precondition before touching any state, so a
//! rejected command never leaves partial keyframes behind. What happens next
//! is up to [`ErrorPolicy`](crate::replay::ErrorPolicy).

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::chip::{GridConfig, PortType, Position};
use crate::contamination::{ContaminationLog, ContaminationRecord};
use crate::error::{ReplayError, ReplayErrorKind};
use crate::replay::config::{ReplayConfig, SpacingMode};
use crate::replay::droplet::{Color, Droplet, DropletId, Keyframe, MERGE_INTERVAL, RADIUS, SPLIT_INTERVAL};
use crate::replay::occupancy::OccupancyMap;
use crate::replay::result::ReplayResult;
use crate::replay::sound::{SoundEffects, SoundTimeline};
use crate::script::{Command, CommandList};

/// Builds droplet trajectories from compiled commands
///
/// Randomness (droplet colors, split color perturbation) comes from an
/// injected generator, so a fixed seed gives reproducible replays.
///
/// # Example
///
/// ```rust
/// use dmfb_rs::chip::{Edge, GridConfig, PortType};
/// use dmfb_rs::replay::{ReplayConfig, TrajectoryBuilder};
/// use dmfb_rs::script::compile;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let grid = GridConfig::new(8, 8)?
///     .with_port(Edge::Left, 0, PortType::Input)?
///     .with_port(Edge::Top, 1, PortType::Output)?;
///
/// let commands = compile("input 0,1,8\nmove 1,1,8,2,8\noutput 5,2,8", &grid)?;
/// let result = TrajectoryBuilder::new(&grid, ReplayConfig::default().seed(1)).replay(&commands);
///
/// assert!(result.is_clean());
/// assert_eq!(result.droplets[0].keyframes().len(), 6);
/// assert_eq!(result.max_time_ms, 6000);
/// # Ok(())
/// # }
/// ```
pub struct TrajectoryBuilder<'g, R: Rng = StdRng> {
    grid: &'g GridConfig,
    config: ReplayConfig,
    rng: R,
}

impl<'g> TrajectoryBuilder<'g, StdRng> {
    /// Builder seeded from `config.seed`, or from the thread RNG when unset
    pub fn new(grid: &'g GridConfig, config: ReplayConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self::with_rng(grid, config, rng)
    }
}

impl<'g, R: Rng> TrajectoryBuilder<'g, R> {
    /// Builder drawing from a caller-supplied generator
    pub fn with_rng(grid: &'g GridConfig, config: ReplayConfig, rng: R) -> Self {
        Self { grid, config, rng }
    }

    pub fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Replay every command in order
    pub fn replay(&mut self, commands: &CommandList) -> ReplayResult {
        let mut replay = Replay::new(self.grid, self.config, &mut self.rng);
        let mut last_time = None;

        'batches: for batch in commands.batches() {
            for command in batch {
                last_time = Some(command.time());
                replay.extend_max(command.time() as f64);

                if let Err(err) = replay.apply(command) {
                    log::warn!("replay violation at t={}s ({}): {}", err.time, err.kind, err);
                    replay.errors.push(err);

                    if self.config.halts_on_error() {
                        replay.occupancy.drain_pending();
                        break 'batches;
                    }
                }
            }
            replay.occupancy.drain_pending();
        }

        let result = replay.finish(last_time);
        log::info!(
            "replayed {} commands: {} droplets, {} keyframes, {} violation(s), end at {} ms",
            commands.len(),
            result.droplets.len(),
            result.keyframe_count(),
            result.errors.len(),
            result.max_time_ms
        );
        result
    }
}

// =================================================================================================
// Replay state
// =================================================================================================

/// First half of a merge waiting for its second half
struct MergeInFlight {
    survivor: DropletId,
    merged: Keyframe,
}

/// First half of a split waiting for its second half
struct SplitInFlight {
    parent: DropletId,
    stretched: Keyframe,
}

struct Replay<'a, R: Rng> {
    grid: &'a GridConfig,
    config: ReplayConfig,
    rng: &'a mut R,
    occupancy: OccupancyMap,
    droplets: Vec<Droplet>,
    min_time_ms: i64,
    max_time_ms: i64,
    sounds: SoundTimeline,
    errors: Vec<ReplayError>,
    contamination: Vec<ContaminationRecord>,
    // keyed by (target cell, end time)
    merges: HashMap<(Position, i64), MergeInFlight>,
    // keyed by (source cell, end time)
    splits: HashMap<(Position, i64), SplitInFlight>,
}

impl<'a, R: Rng> Replay<'a, R> {
    fn new(grid: &'a GridConfig, config: ReplayConfig, rng: &'a mut R) -> Self {
        Self {
            grid,
            config,
            rng,
            occupancy: OccupancyMap::new(grid),
            droplets: Vec::new(),
            min_time_ms: 0,
            max_time_ms: 0,
            sounds: SoundTimeline::new(),
            errors: Vec::new(),
            contamination: Vec::new(),
            merges: HashMap::new(),
            splits: HashMap::new(),
        }
    }

    fn apply(&mut self, command: &Command) -> Result<(), ReplayError> {
        log::debug!("t={}s: {}", command.time(), command.keyword());

        match *command {
            Command::Input { time, at } => self.input(time, at),
            Command::Output { time, at } => self.output(time, at),
            Command::Move { time, from, to } | Command::MixStep { time, from, to } => {
                self.step(command.keyword(), time, from, to)
            }
            Command::MergeStart { time, first, second, target } => self.merge_start(time, first, second, target),
            Command::MergeEnd { time, first, second, target } => {
                self.merge_end(time, first, second, target);
                Ok(())
            }
            Command::SplitStart { time, source, first, second } => self.split_start(time, source, first, second),
            Command::SplitEnd { time, source, first, second } => self.split_end(time, source, first, second),
        }
    }

    // ---------------------------------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------------------------------

    /// Cell formatted in script coordinates
    fn script(&self, pos: Position) -> String {
        let (x, y) = pos.script_coords(self.grid.rows());
        format!("({x}, {y})")
    }

    fn extend_max(&mut self, t: f64) {
        self.max_time_ms = self.max_time_ms.max((t * 1000.0) as i64);
    }

    fn extend_min(&mut self, t: f64) {
        self.min_time_ms = self.min_time_ms.min((t * 1000.0) as i64);
    }

    /// Droplet resting on `pos` and its latest keyframe
    fn occupant(&self, pos: Position) -> Option<(DropletId, Keyframe)> {
        let id = self.occupancy.occupant(pos)?;
        let frame = *self.droplets.get(id)?.last()?;
        Some((id, frame))
    }

    fn can_place(&self, pos: Position, id: DropletId) -> bool {
        self.occupancy.can_place(pos, id, self.config.spacing)
    }

    fn next_id(&self) -> DropletId {
        self.droplets.len()
    }

    fn spawn(&mut self, keyframes: Vec<Keyframe>) -> DropletId {
        let id = self.next_id();
        self.droplets.push(Droplet::new(id, keyframes));
        id
    }

    fn push(&mut self, id: DropletId, frame: Keyframe) {
        self.droplets[id].push(frame);
    }

    fn contaminate(&mut self, time: i64, droplet: DropletId, cell: Position) {
        self.contamination.push(ContaminationRecord::new(time, droplet, cell));
    }

    fn random_color(&mut self) -> Color {
        Color::new(self.rng.random(), self.rng.random(), self.rng.random())
    }

    /// Two child colors whose channels sum to twice the parent's
    fn split_colors(&mut self, parent: Color) -> (Color, Color) {
        let mut first = [0u8; 3];
        let mut second = [0u8; 3];

        for (index, channel) in parent.channels().into_iter().enumerate() {
            let c = i32::from(channel);
            let u = if c <= 127 {
                self.rng.random_range(0..=2 * c)
            } else {
                self.rng.random_range(2 * c - 255..=255)
            };
            first[index] = u as u8;
            second[index] = (2 * c - u) as u8;
        }

        (Color::from_channels(first), Color::from_channels(second))
    }

    // ---------------------------------------------------------------------------------------------
    // Commands
    // ---------------------------------------------------------------------------------------------

    fn input(&mut self, time: i64, at: Position) -> Result<(), ReplayError> {
        if !self.grid.is_port_type(at, PortType::Input) {
            return Err(ReplayError::new(
                time,
                ReplayErrorKind::PortMismatch,
                format!("Cannot place a droplet on time {time}, at {}: position not beside an input port.", self.script(at)),
            ));
        }

        let id = self.next_id();
        if !self.can_place(at, id) {
            return Err(ReplayError::new(
                time,
                ReplayErrorKind::SpacingViolation,
                format!("Cannot place a droplet on time {time}, at {}: static distance constraint failed.", self.script(at)),
            ));
        }

        let color = self.random_color();
        let t = time as f64;
        let staging = self.grid.staging_cell(at);

        self.spawn(vec![
            Keyframe::vanished(t - 1.0, staging, color),
            Keyframe::resting(t, at, color),
        ]);
        self.occupancy.place(at, id);
        self.contaminate(time, id, at);
        self.extend_min(t - 1.0);

        Ok(())
    }

    fn output(&mut self, time: i64, at: Position) -> Result<(), ReplayError> {
        let Some((id, last)) = self.occupant(at) else {
            return Err(ReplayError::new(
                time,
                ReplayErrorKind::NoDropletHere,
                format!("Cannot output a droplet on time {time}, at {}: no droplet here.", self.script(at)),
            ));
        };

        if !self.grid.is_port_type(at, PortType::Output) {
            return Err(ReplayError::new(
                time,
                ReplayErrorKind::PortMismatch,
                format!("Cannot output the droplet on time {time}, at {}: position not beside an output port.", self.script(at)),
            ));
        }

        let t = time as f64;
        let staging = self.grid.staging_cell(at);

        self.push(id, Keyframe::resting(t, at, last.color));
        self.push(id, Keyframe::vanished(t + 1.0, staging, last.color));
        self.occupancy.schedule_release(at);
        self.extend_max(t + 1.0);

        Ok(())
    }

    /// `move` and each leg of `mix`
    fn step(&mut self, verb: &str, time: i64, from: Position, to: Position) -> Result<(), ReplayError> {
        let Some((id, last)) = self.occupant(from) else {
            return Err(ReplayError::new(
                time,
                ReplayErrorKind::NoDropletHere,
                format!("Cannot {verb} on time {time}, at {}: no droplet here.", self.script(from)),
            ));
        };

        if !self.can_place(to, id) {
            return Err(ReplayError::new(
                time,
                ReplayErrorKind::SpacingViolation,
                format!(
                    "Cannot {verb} on time {time}, from {} to {}: dynamic distance constraint failed.",
                    self.script(from),
                    self.script(to)
                ),
            ));
        }

        let t = time as f64;
        let settled = Keyframe { rx: RADIUS, ry: RADIUS, ..last };

        self.push(id, settled.at(t, from));
        self.push(id, settled.at(t + 1.0, to));
        self.occupancy.schedule_release(from);
        self.occupancy.place(to, id);
        self.contaminate(time + 1, id, to);
        self.sounds.trigger(t + 1.0, SoundEffects::MOVE);
        self.extend_max(t + 1.0);

        Ok(())
    }

    fn merge_start(&mut self, time: i64, first: Position, second: Position, target: Position) -> Result<(), ReplayError> {
        let no_droplet = |this: &Self| {
            ReplayError::new(
                time,
                ReplayErrorKind::NoDropletHere,
                format!(
                    "Cannot merge on time {time}, between {} and {}: no droplet here.",
                    this.script(first),
                    this.script(second)
                ),
            )
        };

        let (Some((id1, last1)), Some((id2, last2))) = (self.occupant(first), self.occupant(second)) else {
            return Err(no_droplet(&*self));
        };
        if id1 == id2 {
            return Err(no_droplet(&*self));
        }

        let midpoint_blocked = self
            .occupancy
            .occupant(target)
            .is_some_and(|other| other != id1 && other != id2)
            || (self.config.spacing == SpacingMode::Strict
                && target
                    .neighbours_8()
                    .filter_map(|cell| self.occupancy.occupant(cell))
                    .any(|other| other != id1 && other != id2));
        if midpoint_blocked {
            return Err(ReplayError::new(
                time,
                ReplayErrorKind::SpacingViolation,
                format!("Cannot merge on time {time}, at {}: dynamic distance constraint failed.", self.script(target)),
            ));
        }

        let t = time as f64;
        let s1 = Keyframe { rx: RADIUS, ry: RADIUS, ..last1 }.at(t, first);
        let s2 = Keyframe { rx: RADIUS, ry: RADIUS, ..last2 }.at(t, second);
        let merged = Keyframe {
            t: t + MERGE_INTERVAL,
            cell: target,
            rx: RADIUS * f64::from((first.x - second.x).abs() + 1),
            ry: RADIUS * f64::from((first.y - second.y).abs() + 1),
            opacity: ((u16::from(s1.opacity) + u16::from(s2.opacity)) / 2) as u8,
            color: s1.color.average(s2.color),
        };

        self.push(id1, s1);
        self.push(id2, s2);
        self.push(id1, merged);
        self.push(id2, merged);

        // both cells and the midpoint are held by one identity during the transition
        self.occupancy.remove(first);
        self.occupancy.remove(second);
        for cell in [first, second, target] {
            self.occupancy.place(cell, id2);
        }

        self.merges.insert((target, time + 1), MergeInFlight { survivor: id2, merged });
        self.extend_max(merged.t);

        Ok(())
    }

    fn merge_end(&mut self, time: i64, first: Position, second: Position, target: Position) {
        let Some(MergeInFlight { survivor, merged }) = self.merges.remove(&(target, time)) else {
            log::debug!("t={time}s: merge at {} never started, skipped", self.script(target));
            return;
        };

        let t = time as f64;
        let id = self.spawn(vec![
            merged,
            Keyframe { rx: RADIUS, ry: RADIUS, ..merged }.at(t + 1.0, target),
        ]);
        log::debug!("t={time}s: droplet {survivor} and its partner merged into droplet {id}");

        self.occupancy.schedule_release(first);
        self.occupancy.schedule_release(second);
        self.occupancy.place(target, id);
        self.contaminate(time + 1, id, target);
        self.sounds.trigger(t + 1.0, SoundEffects::MERGE);
        self.extend_max(t + 1.0);
    }

    fn split_start(&mut self, time: i64, source: Position, first: Position, second: Position) -> Result<(), ReplayError> {
        let Some((id, last)) = self.occupant(source) else {
            return Err(ReplayError::new(
                time,
                ReplayErrorKind::NoDropletHere,
                format!("Cannot split on time {time}, at {}: no droplet here.", self.script(source)),
            ));
        };

        if ![source, first, second].into_iter().all(|cell| self.can_place(cell, id)) {
            return Err(ReplayError::new(
                time,
                ReplayErrorKind::SpacingViolation,
                format!("Cannot split on time {time}, at {}: dynamic distance constraint failed.", self.script(source)),
            ));
        }

        let t = time as f64;
        let settled = Keyframe { rx: RADIUS, ry: RADIUS, ..last }.at(t, source);
        let stretched = Keyframe {
            t: t + SPLIT_INTERVAL,
            rx: RADIUS * f64::from((first.x - second.x).abs() + 1),
            ry: RADIUS * f64::from((first.y - second.y).abs() + 1),
            ..settled
        };

        self.push(id, settled);
        self.push(id, stretched);
        for cell in [source, first, second] {
            self.occupancy.place(cell, id);
        }

        self.splits.insert((source, time + 1), SplitInFlight { parent: id, stretched });
        self.sounds.trigger(stretched.t, SoundEffects::SPLITTING);
        self.extend_max(stretched.t);

        Ok(())
    }

    fn split_end(&mut self, time: i64, source: Position, first: Position, second: Position) -> Result<(), ReplayError> {
        let Some(SplitInFlight { parent, stretched }) = self.splits.remove(&(source, time)) else {
            log::debug!("t={time}s: split at {} never started, skipped", self.script(source));
            return Ok(());
        };

        let foreign = |cell: Position| {
            self.occupancy.occupant(cell).is_some_and(|other| other != parent)
        };
        let clear = |cell: Position| match self.config.spacing {
            SpacingMode::Strict => !foreign(cell) && !cell.neighbours_8().any(foreign),
            SpacingMode::Relaxed => !foreign(cell),
        };
        let apart = match self.config.spacing {
            SpacingMode::Strict => (first.x - second.x).abs() > 1 || (first.y - second.y).abs() > 1,
            SpacingMode::Relaxed => first != second,
        };

        if !(clear(first) && clear(second) && apart) {
            return Err(ReplayError::new(
                time,
                ReplayErrorKind::SpacingViolation,
                format!(
                    "Cannot split on time {time}, into {} and {}: dynamic distance constraint failed.",
                    self.script(first),
                    self.script(second)
                ),
            ));
        }

        let t = time as f64;
        let (color1, color2) = self.split_colors(stretched.color);
        let child = |cell: Position, color: Color| Keyframe {
            rx: RADIUS,
            ry: RADIUS,
            color,
            ..stretched.at(t + 1.0, cell)
        };
        let (u, v) = (child(first, color1), child(second, color2));

        let id1 = self.spawn(vec![stretched, u]);
        let id2 = self.spawn(vec![stretched, v]);
        log::debug!("t={time}s: droplet {parent} split into droplets {id1} and {id2}");

        for cell in [source, first, second] {
            self.occupancy.remove(cell);
        }
        self.occupancy.place(first, id1);
        self.occupancy.place(second, id2);

        self.contaminate(time + 1, id1, first);
        self.contaminate(time + 1, id2, second);
        self.sounds.trigger(t + 1.0, SoundEffects::SPLIT);
        self.extend_max(t + 1.0);

        Ok(())
    }

    // ---------------------------------------------------------------------------------------------
    // Finish
    // ---------------------------------------------------------------------------------------------

    fn finish(mut self, last_time: Option<i64>) -> ReplayResult {
        if let Some(last_time) = last_time {
            let end = (last_time + 1) as f64;
            for droplet in &mut self.droplets {
                if let Some(last) = droplet.last().copied()
                    && last.has_nominal_extents()
                    && last.t < end
                {
                    droplet.push(Keyframe { t: end, ..last });
                }
            }
        }

        ReplayResult {
            droplets: self.droplets,
            min_time_ms: self.min_time_ms,
            max_time_ms: self.max_time_ms.div_euclid(1000) * 1000,
            sounds: self.sounds,
            errors: self.errors,
            contamination: ContaminationLog::new(self.contamination),
        }
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::Edge;
    use crate::replay::config::ErrorPolicy;
    use crate::script::compile;
    use approx::assert_relative_eq;

    fn grid() -> GridConfig {
        GridConfig::new(8, 8)
            .unwrap()
            .with_port(Edge::Left, 0, PortType::Input)
            .unwrap()
            .with_port(Edge::Left, 4, PortType::Input)
            .unwrap()
            .with_port(Edge::Top, 1, PortType::Output)
            .unwrap()
    }

    fn run(script: &str, config: ReplayConfig) -> ReplayResult {
        let grid = grid();
        let commands = compile(script, &grid).unwrap();
        TrajectoryBuilder::new(&grid, config.seed(11)).replay(&commands)
    }

    fn run_default(script: &str) -> ReplayResult {
        run(script, ReplayConfig::default())
    }

    #[test]
    fn test_input_keyframes() {
        let result = run_default("input 3,1,8");
        let frames = result.droplets[0].keyframes();

        assert_eq!(frames.len(), 3);
        assert_relative_eq!(frames[0].t, 2.0);
        assert_eq!(frames[0].cell, Position::new(-1, 0));
        assert_eq!((frames[0].rx, frames[0].ry, frames[0].opacity), (0.0, 0.0, 0));
        assert_relative_eq!(frames[1].t, 3.0);
        assert_eq!(frames[1].cell, Position::new(0, 0));
        assert_eq!(frames[1].opacity, 0xff);
        assert_eq!(frames[0].color, frames[1].color);

        // terminal keyframe one second after the last command
        assert_relative_eq!(frames[2].t, 4.0);
        assert_eq!(result.min_time_ms, 0);
        assert_eq!(result.max_time_ms, 3000);
    }

    #[test]
    fn test_input_at_zero_starts_before_zero() {
        let result = run_default("input 0,1,8");
        assert_eq!(result.min_time_ms, -1000);
    }

    #[test]
    fn test_input_port_mismatch() {
        let result = run_default("input 0,3,3");
        let err = result.fatal().unwrap();
        assert_eq!(err.kind, ReplayErrorKind::PortMismatch);
        assert_eq!(err.time, 0);
        assert!(result.droplets.is_empty());
    }

    #[test]
    fn test_move_and_sound() {
        let result = run_default("input 0,1,8\nmove 1,1,8,2,8");
        let frames = result.droplets[0].keyframes();

        assert_eq!(frames.len(), 4);
        assert_relative_eq!(frames[2].t, 1.0);
        assert_eq!(frames[2].cell, Position::new(0, 0));
        assert_relative_eq!(frames[3].t, 2.0);
        assert_eq!(frames[3].cell, Position::new(1, 0));
        assert_eq!(result.sounds.at(1700), SoundEffects::MOVE);
        assert_eq!(result.max_time_ms, 2000);
    }

    #[test]
    fn test_concrete_scenario() {
        let result = run_default("input 0,1,8\nmove 1,1,8,2,8\noutput 5,2,8");
        assert!(result.is_clean());
        assert_eq!(result.droplets.len(), 1);
        assert_eq!(result.droplets[0].keyframes().len(), 6);
        assert_eq!(result.max_time_ms, 6000);
        assert_eq!(result.min_time_ms, -1000);

        let last = result.droplets[0].last().unwrap();
        assert_eq!(last.cell, Position::new(1, -1));
        assert_eq!(last.opacity, 0);
    }

    #[test]
    fn test_output_errors() {
        let result = run_default("output 2,2,8");
        assert_eq!(result.fatal().unwrap().kind, ReplayErrorKind::NoDropletHere);

        let result = run_default("input 0,1,8\noutput 2,1,8");
        assert_eq!(result.fatal().unwrap().kind, ReplayErrorKind::PortMismatch);
    }

    #[test]
    fn test_halt_on_first_stops_replay() {
        let result = run_default("input 0,1,8\nmove 1,5,5,5,4\nmove 2,1,8,2,8");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.fatal().unwrap().time, 1);

        // second move never applied, terminal frame at failing time + 1
        let frames = result.droplets[0].keyframes();
        assert_eq!(frames.len(), 3);
        assert_relative_eq!(frames[2].t, 2.0);
        assert_eq!(frames[2].cell, Position::new(0, 0));
    }

    #[test]
    fn test_collect_all_keeps_going() {
        let config = ReplayConfig::default().error_policy(ErrorPolicy::CollectAll);
        let result = run("input 0,1,8\nmove 1,5,5,5,4\nmove 2,1,8,2,8\noutput 3,3,3", config);

        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.errors[0].kind, ReplayErrorKind::NoDropletHere);
        assert_eq!(result.errors[1].kind, ReplayErrorKind::NoDropletHere);
        assert_eq!(result.droplets[0].keyframes()[3].cell, Position::new(1, 0));
    }

    #[test]
    fn test_spacing_violation_on_input() {
        // left[0] and left[1] are adjacent cells
        let grid = grid().with_port(Edge::Left, 1, PortType::Input).unwrap();
        let commands = compile("input 0,1,8\ninput 1,1,7", &grid).unwrap();

        let strict = TrajectoryBuilder::new(&grid, ReplayConfig::default().seed(1)).replay(&commands);
        assert_eq!(strict.fatal().unwrap().kind, ReplayErrorKind::SpacingViolation);
        assert_eq!(strict.droplets.len(), 1);

        let relaxed = TrajectoryBuilder::new(&grid, ReplayConfig::default().spacing(SpacingMode::Relaxed).seed(1))
            .replay(&commands);
        assert!(relaxed.is_clean());
        assert_eq!(relaxed.droplets.len(), 2);
    }

    #[test]
    fn test_same_tick_input_beside_leaving_droplet_is_rejected() {
        // the output cell (1, 0) is still held while the input at (0, 0) is checked
        let blocked = run_default("input 0,1,8\nmove 1,1,8,2,8\noutput 3,2,8\ninput 3,1,8");
        assert_eq!(blocked.fatal().unwrap().kind, ReplayErrorKind::SpacingViolation);
        assert_eq!(blocked.fatal().unwrap().time, 3);

        let later = run_default("input 0,1,8\nmove 1,1,8,2,8\noutput 3,2,8\ninput 4,1,8");
        assert!(later.is_clean(), "{:?}", later.errors);
        assert_eq!(later.droplets.len(), 2);
    }

    #[test]
    fn test_vacated_cell_blocks_until_batch_end() {
        // A leaves (2, 2) for (3, 2) while B heads for (1, 3), diagonal to A's old cell
        let prefix = "input 0,1,8\nmove 1,1,8,2,8\nmove 2,2,8,3,8\nmove 3,3,8,3,7\nmove 4,3,7,3,6\n\
                      input 5,1,4\nmove 6,3,6,4,6\n";

        let blocked = run_default(&format!("{prefix}move 6,1,4,2,5"));
        assert_eq!(blocked.fatal().unwrap().kind, ReplayErrorKind::SpacingViolation);
        assert_eq!(blocked.fatal().unwrap().time, 6);

        let next_tick = run_default(&format!("{prefix}move 7,1,4,2,5"));
        assert!(next_tick.is_clean(), "{:?}", next_tick.errors);
    }

    #[test]
    fn test_merge_keyframes_and_new_identity() {
        // droplets on (1, 3) and (3, 3) merge on (2, 3)
        let script = "input 0,1,8\nmove 1,1,8,2,8\nmove 2,2,8,3,8\nmove 3,3,8,4,8\nmove 4,4,8,4,7\n\
                      move 5,4,7,4,6\nmove 6,4,6,4,5\n\
                      input 7,1,4\nmove 8,1,4,2,4\nmove 9,2,4,2,5\n\
                      merge 10,2,5,4,5";
        let result = run_default(script);
        assert!(result.is_clean(), "{:?}", result.errors);
        assert_eq!(result.droplets.len(), 3);

        let merged = &result.droplets[2];
        let frames = merged.keyframes();
        assert_relative_eq!(frames[0].t, 10.0 + MERGE_INTERVAL);
        assert_eq!(frames[0].cell, Position::new(2, 3));
        assert_relative_eq!(frames[0].rx, 3.0 * RADIUS);
        assert_relative_eq!(frames[0].ry, RADIUS);
        assert_relative_eq!(frames[1].t, 12.0);
        assert!(frames[1].has_nominal_extents());

        let a = result.droplets[0].keyframes();
        let b = result.droplets[1].keyframes();
        assert_eq!(a.last(), b.last());
        assert_eq!(a.last().unwrap().color, a[a.len() - 2].color.average(b[b.len() - 2].color));

        assert_eq!(result.sounds.at(11700), SoundEffects::MERGE);
        assert_eq!(result.max_time_ms, 12000);
    }

    #[test]
    fn test_merge_requires_both_droplets() {
        let result = run_default("input 0,1,8\nmove 1,1,8,2,8\nmove 2,2,8,3,8\nmerge 3,3,8,5,8");
        assert_eq!(result.fatal().unwrap().kind, ReplayErrorKind::NoDropletHere);
    }

    #[test]
    fn test_merge_beside_third_droplet() {
        // sources on (1, 6) and (7, 6) meet on (4, 6); a third droplet waits on (3, 5)
        let script = "input 0,1,8\nmove 1,1,8,1,7\nmove 2,1,7,1,6\n\
                      input 3,1,8\nmove 4,1,8,2,8\nmove 5,2,8,3,8\nmove 6,3,8,4,8\nmove 7,4,8,5,8\n\
                      move 8,5,8,6,8\nmove 9,6,8,7,8\nmove 10,7,8,7,7\nmove 11,7,7,7,6\n\
                      input 12,1,4\nmove 13,1,4,2,4\nmove 14,2,4,3,4\nmove 15,3,4,3,5\n\
                      merge 16,1,6,7,6";

        let strict = run_default(script);
        assert_eq!(strict.errors.len(), 1);
        assert_eq!(strict.fatal().unwrap().kind, ReplayErrorKind::SpacingViolation);
        assert_eq!(strict.fatal().unwrap().time, 16);
        assert_eq!(strict.droplets.len(), 3);

        // only the midpoint itself matters when spacing is relaxed
        let relaxed = run(script, ReplayConfig::default().spacing(SpacingMode::Relaxed));
        assert!(relaxed.is_clean(), "{:?}", relaxed.errors);
        assert_eq!(relaxed.droplets.len(), 4);
        assert_eq!(relaxed.droplets[3].last().unwrap().cell, Position::new(3, 2));
    }

    #[test]
    fn test_end_without_start_skipped_in_collect_all() {
        let config = ReplayConfig::default().error_policy(ErrorPolicy::CollectAll);
        let result = run("merge 3,3,3,5,3\nsplit 6,4,4,3,4,5,4", config);
        assert_eq!(result.errors.len(), 2);
        assert!(result.droplets.is_empty());
    }

    #[test]
    fn test_split_conserves_color() {
        let script = "input 0,1,8\nmove 1,1,8,2,8\nmove 2,2,8,3,8\nmove 3,3,8,3,7\nsplit 4,3,7,2,7,4,7";
        let result = run_default(script);
        assert!(result.is_clean(), "{:?}", result.errors);
        assert_eq!(result.droplets.len(), 3);

        let parent = result.droplets[0].keyframes();
        let stretched = parent.last().unwrap();
        assert_relative_eq!(stretched.t, 4.0 + SPLIT_INTERVAL);
        assert_relative_eq!(stretched.rx, 3.0 * RADIUS);
        assert_relative_eq!(stretched.ry, RADIUS);

        let u = result.droplets[1].last().unwrap();
        let v = result.droplets[2].last().unwrap();
        assert_eq!(u.cell, Position::new(1, 1));
        assert_eq!(v.cell, Position::new(3, 1));
        for ((pu, pv), ps) in u.color.channels().into_iter()
            .zip(v.color.channels())
            .zip(stretched.color.channels())
        {
            assert_eq!(u16::from(pu) + u16::from(pv), 2 * u16::from(ps));
        }

        assert_eq!(result.sounds.at(4900), SoundEffects::SPLITTING);
        assert_eq!(result.sounds.at(5700), SoundEffects::SPLIT);
    }

    #[test]
    fn test_split_into_adjacent_cells_violates_strict_spacing() {
        let script = "input 0,1,8\nmove 1,1,8,2,8\nmove 2,2,8,3,8\nmove 3,3,8,3,7\nsplit 4,3,7,3,6,4,6";
        let result = run_default(script);
        assert_eq!(result.fatal().unwrap().kind, ReplayErrorKind::SpacingViolation);
        assert_eq!(result.fatal().unwrap().time, 5);
    }

    #[test]
    fn test_contamination_records() {
        let result = run_default("input 0,1,8\nmove 1,1,8,2,8\noutput 5,2,8");
        let records: Vec<(i64, Position)> = result
            .contamination
            .records()
            .iter()
            .map(|record| (record.time, record.cell))
            .collect();
        assert_eq!(records, vec![(0, Position::new(0, 0)), (2, Position::new(1, 0))]);
    }

    #[test]
    fn test_seed_reproducibility() {
        let script = "input 0,1,8\nmove 1,1,8,2,8\nmove 2,2,8,3,8\nmove 3,3,8,3,7\nsplit 4,3,7,2,7,4,7";
        let a = run_default(script);
        let b = run_default(script);
        assert_eq!(a.droplets, b.droplets);
        assert_eq!(a.errors, b.errors);
    }

    #[test]
    fn test_empty_script() {
        let result = run_default("");
        assert!(result.droplets.is_empty());
        assert_eq!((result.min_time_ms, result.max_time_ms), (0, 0));
    }
}
