//! Example: Wash Cycle - Playback, Obstacles and Cleaning
//!
//! Plays a script through a [`Session`] the way a host UI would, pausing at
//! a few seconds to paint obstacles and wash the chip:
//!
//! 1. play half of the script and wash with the droplets still on the chip
//! 2. play to the end and wash again
//! 3. wall off the waste port and show the routing failure
//!
//! [`Session`]: dmfb_rs::session::Session

use dmfb_rs::{
    chip::{Edge, GridConfig, PortType, Position},
    replay::ReplayConfig,
    session::Session,
    wash::WashPlan,
};

const SCRIPT: &str = "\
input 0,1,8
move 1,1,8,2,8
move 2,2,8,3,8
move 3,3,8,3,7
move 4,3,7,3,6
move 5,3,6,4,6
move 6,4,6,5,6
move 7,5,6,5,7
move 8,5,7,5,8
move 9,5,8,4,8
move 10,4,8,3,8
move 11,3,8,2,8
output 12,2,8
";

fn show(session: &Session) {
    println!(
        "  t = {:>5.1} s | contaminated cells: {:>2} | obstacles: {}",
        session.display_secs(),
        session.contamination().contaminated_cells().len(),
        session.obstacles().blocked_cells().len()
    );
}

fn wash(session: &mut Session) {
    match session.wash() {
        Ok(WashPlan::Route(route)) => {
            println!("  wash route: {} steps, {} s", route.len(), route.duration_secs());
            for (i, step) in route.steps().iter().enumerate() {
                let (x, y) = step.script_coords(session.grid().rows());
                print!("{}({}, {})", if i == 0 { "    " } else { " -> " }, x, y);
            }
            println!();
        }
        Ok(WashPlan::NothingToClean) => println!("  nothing to wash"),
        Err(err) => println!("  ✗ {err}"),
    }
    show(session);
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("═══════════════════════════════════════════════════════");
    println!("  Wash Cycle - Playback, Obstacles and Cleaning");
    println!("═══════════════════════════════════════════════════════\n");

    let grid = GridConfig::with_default_ports(8, 8)?
        .with_port(Edge::Left, 0, PortType::Input)?
        .with_port(Edge::Top, 1, PortType::Output)?;

    let mut session = Session::load(grid, SCRIPT, &ReplayConfig::default().seed(9))?;
    show(&session);

    // ====== 1. Halfway ======

    println!("\n1. Playing to t = 6 s");
    while session.display_ms() < 6000 {
        let events = session.advance(40);
        if !events.sounds.is_empty() {
            println!("  ♪ {:?} at {} ms", events.sounds, session.display_ms());
        }
    }
    session.pause();
    show(&session);
    wash(&mut session);

    // ====== 2. End ======

    println!("\n2. Playing to the end");
    while !session.advance(40).finished {}
    show(&session);

    session.toggle_obstacle(Position::new(3, 3));
    session.toggle_obstacle(Position::new(4, 3));
    wash(&mut session);

    // ====== 3. Walled-off waste port ======

    println!("\n3. Walling off the waste port");
    session.reset();
    while !session.advance(1000).finished {}
    session.toggle_obstacle(Position::new(6, 0));
    session.toggle_obstacle(Position::new(7, 1));
    wash(&mut session);

    Ok(())
}
