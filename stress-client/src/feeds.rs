//! Pull command

use crate::FacadeClient;
use crate::error::{ClientError, Result};
use stress_core::domain::feeds::{FeedsRequest, FeedsReturns};
use stress_core::dto::feeds::{PullBody, PullReply};
use tracing::error;

impl FacadeClient {
    /// Pull a window of feeds and the lifecycle status of a run
    ///
    /// # Arguments
    /// * `request` - Run id and per-channel windows to fetch
    ///
    /// # Returns
    /// The parsed feeds, or [`ClientError::Rejected`] when the facade answers
    /// with a non-zero status
    pub async fn pull(&self, request: &FeedsRequest) -> Result<FeedsReturns> {
        let reply = self
            .send_command(
                "pull",
                PullBody {
                    feeds_params: request,
                },
            )
            .await?;

        let parsed: PullReply = serde_json::from_value(reply.clone())
            .map_err(|e| ClientError::ParseError(format!("Malformed pull reply: {}", e)))?;

        if !parsed.status.is_ok() {
            error!("Error getting results from server: {}", reply);
            return Err(ClientError::rejected(parsed.status.status, reply.to_string()));
        }

        let results = parsed
            .results
            .ok_or_else(|| ClientError::ParseError("Pull reply without results".to_string()))?;

        Ok(FeedsReturns::from_results(&results))
    }
}
