//! Authenticated command envelope

use serde::{Deserialize, Serialize};

/// Every request body: credentials, the command name and its own fields
#[derive(Debug, Clone, Serialize)]
pub struct CommandMessage<'a, T: Serialize> {
    pub username: &'a str,
    pub password: &'a str,
    pub command: &'static str,
    #[serde(flatten)]
    pub body: T,
}

/// Commands without a body of their own
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NoBody {}

/// Body of the `stop` command
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StopBody {
    #[serde(rename = "run-id")]
    pub run_id: i64,
}

/// The part of every reply that carries the application status
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusReply {
    pub status: Option<i64>,
    pub reason: Option<String>,
}

impl StatusReply {
    pub fn is_ok(&self) -> bool {
        self.status == Some(0)
    }
}
