//! Pull command DTOs

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::command::StatusReply;
use crate::domain::feeds::{FeedChannel, FeedSlice, FeedsRequest, FeedsReturns, PageRequest};

/// Precision sent with every page request
const PRECISION: i64 = 1;

/// Body of the `pull` command
#[derive(Debug, Clone, Serialize)]
pub struct PullBody<'a> {
    #[serde(rename = "feeds-params")]
    pub feeds_params: &'a FeedsRequest,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct PageParams {
    portfolio_name: &'static str,
    start_index: i64,
    length: i64,
    precision: i64,
}

impl PageParams {
    fn new(channel: FeedChannel, page: &PageRequest) -> Self {
        Self {
            portfolio_name: channel.portfolio_name(),
            start_index: page.start_index,
            length: page.length,
            precision: PRECISION,
        }
    }
}

impl Serialize for FeedsRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("run-id", &self.run_id())?;
        for (channel, page) in self.pages() {
            map.serialize_entry(channel.wire_key(), &PageParams::new(channel, page))?;
        }
        map.end()
    }
}

/// Raw reply of the `pull` command
#[derive(Debug, Deserialize)]
pub struct PullReply {
    #[serde(flatten)]
    pub status: StatusReply,
    pub results: Option<JsonValue>,
}

impl FeedsReturns {
    /// Builds the returns from the `results` object of a pull reply
    ///
    /// Unknown keys are ignored and malformed channels are treated as empty.
    pub fn from_results(results: &JsonValue) -> Self {
        let status = results
            .get("status")
            .and_then(|s| s.get("LifeCycleStatus"))
            .and_then(JsonValue::as_str)
            .map(str::to_string);

        let slices = FeedChannel::ALL
            .iter()
            .filter_map(|&channel| {
                let raw = results.get(channel.wire_key())?;
                Some((channel, parse_slice(channel, raw)))
            })
            .collect();

        Self { status, slices }
    }
}

fn parse_slice(channel: FeedChannel, raw: &JsonValue) -> FeedSlice {
    let array = |value: Option<&JsonValue>| {
        value
            .and_then(JsonValue::as_array)
            .cloned()
            .unwrap_or_default()
    };

    match channel.slice_key() {
        Some(key) => FeedSlice {
            next_index: raw.get("NextIndex").and_then(JsonValue::as_i64),
            feeds: array(raw.get(key)),
        },
        None => FeedSlice {
            next_index: None,
            feeds: array(Some(raw)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feeds::UNBOUNDED_LENGTH;
    use crate::dto::command::CommandMessage;
    use serde_json::json;

    #[test]
    fn test_pull_message_shape() {
        let req = FeedsRequest::new(77)
            .with_page(FeedChannel::BenchmarkPortfolios, PageRequest::new(3, 100))
            .with_page(FeedChannel::RiskGrids, PageRequest::new(0, UNBOUNDED_LENGTH));
        let msg = CommandMessage {
            username: "u",
            password: "p",
            command: "pull",
            body: PullBody { feeds_params: &req },
        };

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["command"], "pull");
        assert_eq!(
            json["feeds-params"],
            json!({
                "run-id": 77,
                "benchmark-portfolios": {
                    "portfolio-name": "b", "start-index": 3, "length": 100, "precision": 1
                },
                "risk-grids": {
                    "portfolio-name": "p", "start-index": 0, "length": 2147483647, "precision": 1
                }
            })
        );
    }

    #[test]
    fn test_parse_results() {
        let results = json!({
            "status": {"LifeCycleStatus": "Running"},
            "portfolios": {"NextIndex": 12, "Portfolios": [{"a": 1}, {"a": 2}]},
            "risks": {"NextIndex": -1},
            "portfolio-grids": [{"g": 1}],
            "unrelated": 5
        });

        let returns = FeedsReturns::from_results(&results);
        assert_eq!(returns.status.as_deref(), Some("Running"));

        let portfolios = returns.slice(FeedChannel::Portfolios).unwrap();
        assert_eq!(portfolios.next_index, Some(12));
        assert_eq!(portfolios.feeds.len(), 2);

        assert_eq!(returns.resume_index(FeedChannel::Risks), 0);
        assert_eq!(
            returns.slice(FeedChannel::PortfolioGrids).unwrap().feeds.len(),
            1
        );
        assert!(returns.slice(FeedChannel::Trades).is_none());
        assert_eq!(returns.feed_count(), 3);
    }

    #[test]
    fn test_parse_reply_with_error_status() {
        let reply: PullReply =
            serde_json::from_value(json!({"status": 2, "reason": "no such run"})).unwrap();
        assert!(!reply.status.is_ok());
        assert!(reply.results.is_none());
    }
}
