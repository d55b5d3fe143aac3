//! Integration tests: contamination tracking + wash router
//!
//! Contamination comes from real replays of the fixture scripts; routes are
//! planned on the demo chip (wash beside script cell (1, 1), waste beside
//! (8, 8)).

use dmfb_rs::chip::{Edge, GridConfig, PortType, Position};
use dmfb_rs::contamination::ContaminationMap;
use dmfb_rs::error::WashError;
use dmfb_rs::output::{CsvExporter, Exporter};
use dmfb_rs::wash::{ObstacleMask, WashPlan, WashRoute, WashRouter};
use tempfile::NamedTempFile;

mod common;
use common::{assert_route_connected, demo_chip, replay, MERGE_SCRIPT, SIMPLE_SCRIPT};

fn fully_contaminated(script: &str) -> ContaminationMap {
    let mut map = ContaminationMap::new(&demo_chip());
    map.apply_all(replay(script).contamination.records());
    map
}

fn expect_route(plan: Result<WashPlan, WashError>) -> WashRoute {
    match plan {
        Ok(WashPlan::Route(route)) => route,
        other => panic!("expected a route, got {other:?}"),
    }
}

#[test]
fn test_route_sweeps_every_contaminated_cell() {
    let grid = demo_chip();
    let mut contamination = fully_contaminated(MERGE_SCRIPT);
    let dirty = contamination.contaminated_cells();
    assert!(dirty.len() > 5);

    let route = expect_route(WashRouter::new(&grid).plan(&ObstacleMask::new(&grid), &contamination));

    assert_eq!(route.steps().first(), Some(&Position::new(0, 8)));
    assert_eq!(route.steps()[1], Position::new(0, 7));
    assert_eq!(route.steps().last(), Some(&Position::new(7, -1)));
    assert_route_connected(&route);
    for cell in &dirty {
        assert!(route.visits(*cell), "{cell} left dirty");
    }

    contamination.clean_route(route.steps());
    assert_eq!(contamination.residue_count(), 0);
}

#[test]
fn test_route_goes_around_painted_wall() {
    let grid = demo_chip();
    let mut obstacles = ObstacleMask::new(&grid);
    for y in 0..7 {
        assert!(obstacles.toggle(&grid, Position::new(5, y)));
    }

    let route = expect_route(WashRouter::new(&grid).plan(&obstacles, &fully_contaminated(MERGE_SCRIPT)));
    assert_route_connected(&route);
    assert!(route.on_chip(&grid).all(|cell| !obstacles.is_blocked(cell)));
    assert!(route.visits(Position::new(5, 7)));
}

#[test]
fn test_walled_off_waste_port_has_no_route() {
    let grid = demo_chip();
    let mut obstacles = ObstacleMask::new(&grid);
    obstacles.toggle(&grid, Position::new(6, 0));
    obstacles.toggle(&grid, Position::new(7, 1));

    let plan = WashRouter::new(&grid).plan(&obstacles, &fully_contaminated(SIMPLE_SCRIPT));
    assert_eq!(plan, Err(WashError::NoRoute));
}

#[test]
fn test_resting_droplet_shields_its_residue() {
    let grid = demo_chip();
    let result = replay(SIMPLE_SCRIPT);

    // at t = 3 the droplet rests on (1, 0), covering both dirty cells
    let mut contamination = ContaminationMap::new(&grid);
    contamination.apply_all(result.contamination.until(3000));
    assert_eq!(contamination.contaminated_cells().len(), 2);

    let obstacles = ObstacleMask::new(&grid).with_droplets(&result.droplets, 3.0);
    assert!(obstacles.is_blocked(Position::new(0, 0)));

    let plan = WashRouter::new(&grid).plan(&obstacles, &contamination);
    assert_eq!(plan, Ok(WashPlan::NothingToClean));
}

#[test]
fn test_clean_chip_needs_no_wash() {
    let grid = demo_chip();
    let plan = WashRouter::new(&grid).plan(&ObstacleMask::new(&grid), &ContaminationMap::new(&grid));
    assert_eq!(plan, Ok(WashPlan::NothingToClean));
}

#[test]
fn test_chip_without_wash_port() {
    let grid = GridConfig::new(6, 6)
        .unwrap()
        .with_port(Edge::Left, 0, PortType::Input)
        .unwrap()
        .with_port(Edge::Right, 3, PortType::Output)
        .unwrap();
    let plan = WashRouter::new(&grid).plan(&ObstacleMask::new(&grid), &ContaminationMap::new(&grid));
    assert_eq!(plan, Err(WashError::NoWashPort));
}

#[test]
fn test_route_export() {
    let grid = demo_chip();
    let route = expect_route(WashRouter::new(&grid).plan(&ObstacleMask::new(&grid), &fully_contaminated(SIMPLE_SCRIPT)));

    let file = NamedTempFile::new().unwrap();
    CsvExporter::default()
        .export_route(&route, &grid, file.path().to_str().unwrap())
        .unwrap();

    let content = std::fs::read_to_string(file.path()).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "step,x,y");
    assert_eq!(lines.len(), route.len() + 1);
    // wash staging cell lies below script cell (1, 1)
    assert_eq!(lines[1], "0,1,0");
    assert_eq!(lines.last().copied(), Some(format!("{},8,9", route.len() - 1).as_str()));
}
