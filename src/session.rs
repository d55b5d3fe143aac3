//! Playback session
//!
//! A [`Session`] is what a host UI drives: it owns one replayed script, a
//! display clock in milliseconds and the contamination and obstacle state
//! that evolve as the clock moves. Rendering, audio and timers stay with the
//! host, which calls [`Session::advance`] on every tick and reacts to the
//! returned [`PlaybackEvents`].
//!
//! # Clock rules
//!
//! | Operation   | Display time afterwards                        | Contamination folded          |
//! |-------------|------------------------------------------------|-------------------------------|
//! | `advance`   | `now + delta`, clamped to the end              | records in `[before, after)` ¹|
//! | `pause`     | truncated to the whole second                  | none                          |
//! | `step`      | next whole second, clamped to the end          | records stamped at that second|
//! | `revert`    | previous whole second, not before the start    | none                          |
//! | `reset`     | start of the simulation                        | none                          |
//!
//! ¹ The tick that reaches the end also folds the records stamped at it.
//!
//! # Example
//!
//! ```rust
//! use dmfb_rs::chip::{Edge, GridConfig, PortType};
//! use dmfb_rs::replay::ReplayConfig;
//! use dmfb_rs::session::Session;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let grid = GridConfig::with_default_ports(8, 8)?
//!     .with_port(Edge::Left, 0, PortType::Input)?
//!     .with_port(Edge::Top, 1, PortType::Output)?;
//!
//! let mut session = Session::load(grid, "input 0,1,8\nmove 1,1,8,2,8\noutput 5,2,8", &ReplayConfig::default())?;
//! while !session.advance(250).finished {}
//!
//! assert_eq!(session.display_ms(), 6000);
//! assert_eq!(session.contamination().contaminated_cells().len(), 2);
//! # Ok(())
//! # }
//! ```

use crate::chip::{GridConfig, Position};
use crate::contamination::ContaminationMap;
use crate::error::{ReplayError, SessionError, WashError};
use crate::replay::{ReplayConfig, ReplayResult, SoundEffects, TrajectoryBuilder};
use crate::wash::{ObstacleMask, WashPlan, WashRouter};

/// What happened while the display clock moved
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackEvents {
    /// Union of the sound cues passed over
    pub sounds: SoundEffects,

    /// Replay violations whose second was reached
    pub errors: Vec<ReplayError>,

    /// The clock sits at the end of the simulation
    pub finished: bool,
}

/// One loaded script and its playback state
pub struct Session {
    grid: GridConfig,
    result: ReplayResult,
    display_ms: i64,
    /// Violations up to this second have been reported
    reported_until: i64,
    contamination: ContaminationMap,
    obstacles: ObstacleMask,
}

impl Session {
    /// Validate the chip, compile and replay the script
    ///
    /// The clock starts at the earliest keyframe, with a clean chip and no
    /// painted obstacles.
    pub fn load(grid: GridConfig, script: &str, config: &ReplayConfig) -> Result<Self, SessionError> {
        grid.validate()?;
        let commands = crate::script::compile(script, &grid)?;
        let result = TrajectoryBuilder::new(&grid, *config).replay(&commands);
        Ok(Self::from_result(grid, result))
    }

    /// Start playback of an existing replay
    pub fn from_result(grid: GridConfig, result: ReplayResult) -> Self {
        log::debug!(
            "session loaded: {} droplets, clock {}..={} ms",
            result.droplets.len(),
            result.min_time_ms,
            result.max_time_ms
        );

        Self {
            contamination: ContaminationMap::new(&grid),
            obstacles: ObstacleMask::new(&grid),
            display_ms: result.min_time_ms,
            reported_until: result.min_time_ms.div_euclid(1000) - 1,
            grid,
            result,
        }
    }

    // =============================================================================================
    // Accessors
    // =============================================================================================

    pub fn grid(&self) -> &GridConfig {
        &self.grid
    }

    pub fn result(&self) -> &ReplayResult {
        &self.result
    }

    pub fn display_ms(&self) -> i64 {
        self.display_ms
    }

    /// Display time in seconds, the unit droplet keyframes use
    pub fn display_secs(&self) -> f64 {
        self.display_ms as f64 / 1000.0
    }

    pub fn contamination(&self) -> &ContaminationMap {
        &self.contamination
    }

    pub fn obstacles(&self) -> &ObstacleMask {
        &self.obstacles
    }

    pub fn is_finished(&self) -> bool {
        self.display_ms >= self.result.max_time_ms
    }

    // =============================================================================================
    // Clock
    // =============================================================================================

    /// Move the clock forward by `delta_ms`
    ///
    /// Non-positive deltas leave the clock where it is. Violations are
    /// reported once, on the first call that reaches their second, the
    /// starting second included.
    pub fn advance(&mut self, delta_ms: i64) -> PlaybackEvents {
        let before = self.display_ms;
        let after = before.saturating_add(delta_ms.max(0)).min(self.result.max_time_ms).max(before);
        let moved = after > before;

        // the finishing tick also takes the records stamped at the very end
        let fold_until = if moved && after == self.result.max_time_ms { after + 1 } else { after };
        self.contamination.apply_all(self.result.contamination.between(before, fold_until));

        let errors = self.report_until(after.div_euclid(1000));

        self.display_ms = after;

        PlaybackEvents {
            sounds: self.result.sounds.between(before, after),
            errors,
            finished: self.is_finished(),
        }
    }

    /// Violations not yet reported, up to and including `second`
    fn report_until(&mut self, second: i64) -> Vec<ReplayError> {
        let from = self.reported_until;
        self.reported_until = from.max(second);
        self.result
            .errors
            .iter()
            .filter(|err| from < err.time && err.time <= second)
            .cloned()
            .collect()
    }

    /// Truncate the clock to the whole second
    pub fn pause(&mut self) {
        self.display_ms = self.display_ms.div_euclid(1000) * 1000;
    }

    /// Jump to the next whole second
    ///
    /// Violations of the current second not reported yet come out before the
    /// jump.
    pub fn step(&mut self) -> PlaybackEvents {
        let second = self.display_ms.div_euclid(1000);
        let errors = self.report_until(second);

        let before = self.display_ms;
        self.display_ms = ((second + 1) * 1000).min(self.result.max_time_ms).max(before);
        if self.display_ms > before {
            let reached = self.display_ms.div_euclid(1000);
            self.contamination.apply_all(self.result.contamination.at(reached));
        }

        PlaybackEvents {
            sounds: SoundEffects::empty(),
            errors,
            finished: self.is_finished(),
        }
    }

    /// Jump back to the previous whole second
    ///
    /// Contamination already folded stays on the chip. Violations after the
    /// new display second are reported again when the clock passes them.
    pub fn revert(&mut self) {
        let ceiling = -(-self.display_ms).div_euclid(1000);
        self.display_ms = ((ceiling - 1) * 1000).max(self.result.min_time_ms);
        self.reported_until = self.reported_until.min(self.display_ms.div_euclid(1000));
    }

    /// Back to the start of the simulation
    pub fn reset(&mut self) {
        self.display_ms = self.result.min_time_ms;
        self.reported_until = self.result.min_time_ms.div_euclid(1000) - 1;
    }

    // =============================================================================================
    // Washing
    // =============================================================================================

    /// Paint or erase an obstacle
    ///
    /// Ignored on chips without a wash port. Returns the new state of the cell.
    pub fn toggle_obstacle(&mut self, pos: Position) -> bool {
        if !self.grid.has_wash() {
            return false;
        }
        self.obstacles.toggle(&self.grid, pos)
    }

    /// Forget every painted obstacle
    pub fn clear_obstacles(&mut self) {
        self.obstacles.clear();
    }

    /// Plan a wash at the current display time and clean the visited cells
    ///
    /// Droplets visible at the display time are obstacles for the cleaning
    /// droplet, in addition to the painted cells.
    pub fn wash(&mut self) -> Result<WashPlan, WashError> {
        let mask = self.obstacles.with_droplets(&self.result.droplets, self.display_secs());
        let plan = WashRouter::new(&self.grid).plan(&mask, &self.contamination)?;

        if let WashPlan::Route(route) = &plan {
            self.contamination.clean_route(route.steps());
            log::info!(
                "washed {} cells, {} still contaminated",
                route.on_chip(&self.grid).count(),
                self.contamination.contaminated_cells().len()
            );
        }

        Ok(plan)
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{Edge, PortType};
    use approx::assert_relative_eq;

    const SCRIPT: &str = "input 0,1,8\nmove 1,1,8,2,8\noutput 5,2,8";

    fn grid() -> GridConfig {
        GridConfig::with_default_ports(8, 8)
            .unwrap()
            .with_port(Edge::Left, 0, PortType::Input)
            .unwrap()
            .with_port(Edge::Top, 1, PortType::Output)
            .unwrap()
    }

    fn session(script: &str) -> Session {
        Session::load(grid(), script, &ReplayConfig::default().seed(3)).unwrap()
    }

    #[test]
    fn test_load_starts_at_min_time() {
        let session = session(SCRIPT);
        assert_eq!(session.display_ms(), -1000);
        assert_relative_eq!(session.display_secs(), -1.0);
        assert!(session.contamination().contaminated_cells().is_empty());
        assert!(!session.is_finished());
    }

    #[test]
    fn test_load_rejects_invalid_chip() {
        let grid = GridConfig::new(8, 8).unwrap();
        let result = Session::load(grid, SCRIPT, &ReplayConfig::default());
        assert!(matches!(result, Err(SessionError::Config(_))));
    }

    #[test]
    fn test_load_rejects_bad_script() {
        let result = Session::load(grid(), "teleport 1,1,1", &ReplayConfig::default());
        assert!(matches!(result, Err(SessionError::Parse(_))));
    }

    #[test]
    fn test_advance_folds_contamination() {
        let mut session = session(SCRIPT);

        let events = session.advance(1500);
        assert_eq!(session.display_ms(), 500);
        assert!(events.sounds.is_empty());
        assert!(!events.finished);
        assert_eq!(session.contamination().contaminated_cells(), vec![Position::new(0, 0)]);

        // the move cue sits at 1700 ms
        let events = session.advance(1500);
        assert!(events.sounds.contains(SoundEffects::MOVE));
        assert_eq!(session.contamination().contaminated_cells().len(), 1);

        let events = session.advance(60_000);
        assert!(events.finished);
        assert_eq!(session.display_ms(), 6000);
        assert_eq!(session.contamination().contaminated_cells().len(), 2);
    }

    #[test]
    fn test_last_move_is_folded_at_the_end() {
        let script = "input 0,1,8\nmove 1,1,8,2,8";
        let expected = vec![Position::new(0, 0), Position::new(1, 0)];

        let mut ticked = session(script);
        while !ticked.advance(100).finished {}
        assert_eq!(ticked.display_ms(), 2000);
        assert_eq!(ticked.contamination().contaminated_cells(), expected);

        let mut jumped = session(script);
        assert!(jumped.advance(60_000).finished);
        assert_eq!(jumped.contamination(), ticked.contamination());

        let mut stepped = session(script);
        while !stepped.step().finished {}
        assert_eq!(stepped.contamination(), ticked.contamination());

        // the end is folded once; later calls have nothing left to add
        ticked.advance(100);
        ticked.step();
        assert_eq!(ticked.contamination().residue_count(), 2);
    }

    #[test]
    fn test_huge_delta_stops_at_the_end() {
        let mut session = session(SCRIPT);
        assert!(session.advance(i64::MAX).finished);
        assert_eq!(session.display_ms(), 6000);
        assert!(session.advance(i64::MAX).finished);
    }

    #[test]
    fn test_load_rejects_out_of_range_time() {
        let result = Session::load(grid(), "input 10000000000000000,1,8", &ReplayConfig::default());
        assert!(matches!(result, Err(SessionError::Parse(_))));
    }

    #[test]
    fn test_violation_at_the_starting_second() {
        let mut session = session("move 0,1,8,2,8");
        assert_eq!((session.result().min_time_ms, session.result().max_time_ms), (0, 0));
        assert!(session.is_finished());

        let events = session.advance(100);
        assert!(events.finished);
        assert_eq!(events.errors.len(), 1);
        assert_eq!(events.errors[0].time, 0);
        assert!(session.advance(100).errors.is_empty());
        assert!(session.step().errors.is_empty());

        session.reset();
        assert_eq!(session.step().errors.len(), 1);
        assert!(session.advance(100).errors.is_empty());
    }

    #[test]
    fn test_step_then_advance_reports_once() {
        let mut session = session("input 0,1,8\noutput 2,1,8");
        session.advance(3000);
        assert_eq!(session.display_ms(), 2000);
        assert!(session.step().errors.is_empty());

        // passing the second again after a revert reports it again
        session.revert();
        assert_eq!(session.display_ms(), 1000);
        assert_eq!(session.advance(1000).errors.len(), 1);
    }

    #[test]
    fn test_negative_delta_is_ignored() {
        let mut session = session(SCRIPT);
        session.advance(2000);
        session.advance(-500);
        assert_eq!(session.display_ms(), 1000);
    }

    #[test]
    fn test_advance_reports_error_when_its_second_is_reached() {
        let mut session = session("input 0,1,8\noutput 2,1,8");
        assert_eq!(session.result().errors.len(), 1);

        assert!(session.advance(2500).errors.is_empty());
        let events = session.advance(2000);
        assert_eq!(events.errors.len(), 1);
        assert_eq!(events.errors[0].time, 2);
        assert!(session.advance(1000).errors.is_empty());
    }

    #[test]
    fn test_step_walks_whole_seconds() {
        let mut session = session(SCRIPT);

        session.step();
        assert_eq!(session.display_ms(), 0);
        assert!(session.contamination().is_contaminated(Position::new(0, 0)));

        session.step();
        session.step();
        assert_eq!(session.display_ms(), 2000);
        assert!(session.contamination().is_contaminated(Position::new(1, 0)));

        for _ in 0..10 {
            session.step();
        }
        assert_eq!(session.display_ms(), 6000);
        assert!(session.is_finished());
    }

    #[test]
    fn test_step_reports_error_of_current_second() {
        let mut session = session("input 0,1,8\noutput 2,1,8");
        for _ in 0..3 {
            assert!(session.step().errors.is_empty());
        }
        assert_eq!(session.display_ms(), 2000);
        assert_eq!(session.step().errors.len(), 1);
    }

    #[test]
    fn test_pause_truncates() {
        let mut session = session(SCRIPT);
        session.advance(500);
        assert_eq!(session.display_ms(), -500);
        session.pause();
        assert_eq!(session.display_ms(), -1000);

        session.advance(3700);
        session.pause();
        assert_eq!(session.display_ms(), 2000);
    }

    #[test]
    fn test_revert_and_reset() {
        let mut session = session(SCRIPT);
        session.advance(3500);
        assert_eq!(session.display_ms(), 2500);

        session.revert();
        assert_eq!(session.display_ms(), 2000);
        session.revert();
        assert_eq!(session.display_ms(), 1000);

        session.reset();
        assert_eq!(session.display_ms(), -1000);
        session.revert();
        assert_eq!(session.display_ms(), -1000);
    }

    #[test]
    fn test_toggle_requires_wash_port() {
        let grid = GridConfig::new(8, 8)
            .unwrap()
            .with_port(Edge::Left, 0, PortType::Input)
            .unwrap()
            .with_port(Edge::Top, 1, PortType::Output)
            .unwrap();
        let mut session = Session::load(grid, SCRIPT, &ReplayConfig::default()).unwrap();
        assert!(!session.toggle_obstacle(Position::new(3, 3)));
        assert!(session.obstacles().blocked_cells().is_empty());
    }

    #[test]
    fn test_toggle_and_clear_obstacles() {
        let mut session = session(SCRIPT);
        assert!(session.toggle_obstacle(Position::new(3, 3)));
        assert!(!session.toggle_obstacle(Position::new(0, 7)));
        assert_eq!(session.obstacles().blocked_cells(), vec![Position::new(3, 3)]);
        session.clear_obstacles();
        assert!(session.obstacles().blocked_cells().is_empty());
    }

    #[test]
    fn test_wash_cleans_route() {
        let mut session = session(SCRIPT);
        session.advance(60_000);

        let plan = session.wash().unwrap();
        let WashPlan::Route(route) = plan else {
            panic!("expected a route");
        };
        assert!(route.visits(Position::new(0, 0)));
        assert!(route.visits(Position::new(1, 0)));
        assert!(session.contamination().contaminated_cells().is_empty());

        assert_eq!(session.wash(), Ok(WashPlan::NothingToClean));
    }

    #[test]
    fn test_wash_without_wash_port() {
        let grid = GridConfig::new(8, 8)
            .unwrap()
            .with_port(Edge::Left, 0, PortType::Input)
            .unwrap()
            .with_port(Edge::Top, 1, PortType::Output)
            .unwrap();
        let mut session = Session::load(grid, SCRIPT, &ReplayConfig::default()).unwrap();
        assert_eq!(session.wash(), Err(WashError::NoWashPort));
    }
}
