//! Facade API seam
//!
//! The executor only depends on this trait, so run lifecycles can be driven
//! against an in-memory facade in tests.

use async_trait::async_trait;
use stress_core::domain::RunId;
use stress_core::domain::feeds::{FeedsRequest, FeedsReturns};
use stress_core::dto::play::{PlayParams, PlayResponse};

use crate::FacadeClient;
use crate::error::Result;

/// Commands the stress tester sends to the facade
#[async_trait]
pub trait FacadeApi: Send + Sync {
    /// Submits a strategy run
    async fn play(&self, params: &PlayParams) -> Result<PlayResponse>;

    /// Fetches lifecycle status and feed windows for a run
    async fn pull(&self, request: &FeedsRequest) -> Result<FeedsReturns>;

    /// Requests cancellation of one run
    async fn stop(&self, run_id: RunId) -> Result<()>;

    /// Requests cancellation of every run of the account
    async fn stop_all(&self) -> Result<()>;
}

#[async_trait]
impl FacadeApi for FacadeClient {
    async fn play(&self, params: &PlayParams) -> Result<PlayResponse> {
        FacadeClient::play(self, params).await
    }

    async fn pull(&self, request: &FeedsRequest) -> Result<FeedsReturns> {
        FacadeClient::pull(self, request).await
    }

    async fn stop(&self, run_id: RunId) -> Result<()> {
        FacadeClient::stop(self, run_id).await
    }

    async fn stop_all(&self) -> Result<()> {
        FacadeClient::stop_all(self).await
    }
}
