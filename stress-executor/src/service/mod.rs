//! Service layer
//!
//! Services contain the stress testing logic. They start strategy runs
//! through a [`RunLauncher`](crate::scheduler::RunLauncher) and never talk to
//! the facade directly, so every service can be tested with in-memory
//! launchers.

mod collector;
mod controller;
mod scenario_runner;
mod speed;

pub use controller::ControllerSettings;
pub use scenario_runner::{ScenarioReport, ScenarioRunner};
