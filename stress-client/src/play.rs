//! Play command

use crate::FacadeClient;
use crate::error::Result;
use stress_core::dto::play::{PlayParams, PlayResponse};

impl FacadeClient {
    /// Start a strategy run
    ///
    /// A reply that the server produced but that does not start the run is
    /// returned as [`PlayResponse::Rejected`], not as an error.
    ///
    /// # Arguments
    /// * `params` - What to run and over which period
    pub async fn play(&self, params: &PlayParams) -> Result<PlayResponse> {
        let reply = self.send_command("play", params).await?;

        Ok(PlayResponse::from_json(&reply))
    }
}
