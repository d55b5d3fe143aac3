//! Wash routing
//!
//! Plans the path of a cleaning droplet that enters through the wash port,
//! sweeps every reachable contaminated cell and leaves through the waste port.
//!
//! - **`obstacles`**: painted cells and droplet footprints ([`ObstacleMask`])
//! - **`router`**: the planner ([`WashRouter`]) and its output ([`WashPlan`])
//!
//! Planning is a pure function of its inputs: the caller decides what to do
//! with the route (typically cleaning the visited cells with
//! [`ContaminationMap::clean_route`](crate::contamination::ContaminationMap::clean_route)).

mod obstacles;
mod router;

pub use obstacles::ObstacleMask;
pub use router::{WashPlan, WashRoute, WashRouter};
