//! Run launcher seam

use async_trait::async_trait;
use stress_core::domain::status::RunOutcome;

/// Starts one strategy run and resolves once it reached a terminal status
///
/// The speed decider and the stress controller only depend on this trait;
/// [`StrategyPlayer`](super::StrategyPlayer) is the production implementation.
#[async_trait]
pub trait RunLauncher: Send + Sync {
    async fn launch(&self) -> RunOutcome;
}
