//! Data Transfer Objects for the facade API
//!
//! All commands are POSTed as JSON objects to one endpoint; a `command`
//! field selects the behaviour. These types own the exact field names.

pub mod command;
pub mod feeds;
pub mod play;
