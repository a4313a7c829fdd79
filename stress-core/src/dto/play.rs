//! Play command DTOs

use serde::{Deserialize, Serialize};

use super::command::StatusReply;
use crate::domain::RunId;

/// Parameters needed to start one strategy run
///
/// Built once per scenario and shared by every run of it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PlayParams {
    pub code: String,
    pub owner: String,
    pub title: String,
    pub time_unit: String,
    pub language: String,
    pub start_date: u32,
    pub end_date: u32,
    pub initial_cash: f64,
    pub run_type: String,
    pub portfolio_name: Option<String>,
    pub benchmark_name: Option<String>,
}

impl Default for PlayParams {
    fn default() -> Self {
        Self {
            code: String::new(),
            owner: String::new(),
            title: String::new(),
            time_unit: "d".to_string(),
            language: "python".to_string(),
            start_date: 20140101,
            end_date: 20150101,
            initial_cash: 100000.0,
            run_type: "backtest".to_string(),
            portfolio_name: None,
            benchmark_name: None,
        }
    }
}

/// Outcome of the play command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayResponse {
    /// The server accepted the strategy and assigned a run id
    Started(RunId),
    /// The server answered but refused to start the strategy
    Rejected(String),
}

#[derive(Debug, Deserialize)]
struct PlayReply {
    #[serde(flatten)]
    status: StatusReply,
    #[serde(rename = "run-id")]
    run_id: Option<RunId>,
}

impl PlayResponse {
    /// Interprets a raw play reply
    pub fn from_json(value: &serde_json::Value) -> Self {
        let reply: PlayReply = match serde_json::from_value(value.clone()) {
            Ok(reply) => reply,
            Err(e) => return Self::Rejected(format!("Malformed play reply: {}", e)),
        };

        if !reply.status.is_ok() {
            return Self::Rejected(
                reply
                    .status
                    .reason
                    .unwrap_or_else(|| "Fail reason not set by server".to_string()),
            );
        }

        match reply.run_id {
            Some(run_id) => Self::Started(run_id),
            None => Self::Rejected("Run id not set by server".to_string()),
        }
    }
}
