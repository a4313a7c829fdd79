//! Scheduler layer for the stress tester
//!
//! This layer owns the lifecycle of individual strategy runs: submitting
//! them, polling their feeds until the server reports an exit, and enforcing
//! the hard deadline. Everything above it only sees [`RunOutcome`]s.
//!
//! [`RunOutcome`]: stress_core::domain::status::RunOutcome

pub mod launcher;
pub mod player;

pub use launcher::RunLauncher;
pub use player::StrategyPlayer;
