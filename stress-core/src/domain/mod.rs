//! Core domain types
//!
//! These types describe a single strategy run as seen by the stress tester:
//! how the server reports its lifecycle, how the tester classifies its end,
//! and how feed pagination advances while the run is alive.

pub mod feeds;
pub mod status;

/// Identifier assigned by the server when a strategy run is accepted
pub type RunId = i64;
