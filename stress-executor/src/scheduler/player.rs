//! Strategy player
//!
//! Drives one strategy run from submission to a terminal status:
//!
//! 1. Submitting: `play` is re-issued until the transport gets it through.
//!    A reply without run id ends the run as an error.
//! 2. Polling: the first five feed channels are pulled page by page. Each
//!    response schedules the next pull, 1s later when a channel advanced and
//!    5s later when nothing changed.
//! 3. Draining: after `NormalExit` one last pull fetches everything left,
//!    plus the grids when requested.
//!
//! A watchdog task asks the server to stop the run once it exceeds its hard
//! deadline. It never finishes the run itself; the next pull reports whatever
//! exit the server chose.

use std::sync::Arc;

use async_trait::async_trait;
use stress_client::{FacadeApi, RetryPolicy};
use stress_core::domain::RunId;
use stress_core::domain::feeds::{DEFAULT_PAGE_SIZE, FeedsRequest, FeedsReturns};
use stress_core::domain::status::{RunOutcome, RunStatus};
use stress_core::dto::play::{PlayParams, PlayResponse};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};
use tracing::{debug, info, warn};

use super::launcher::RunLauncher;

/// Delays driving the polling loop and the watchdog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTiming {
    /// Delay before the next pull when no channel advanced
    pub idle_delay: Duration,
    /// Delay before the next pull when at least one channel advanced
    pub active_delay: Duration,
    /// How often the watchdog compares the run time with the hard deadline
    pub watchdog_interval: Duration,
    /// Page length of the regular pulls
    pub page_size: i64,
}

impl Default for PollTiming {
    fn default() -> Self {
        Self {
            idle_delay: Duration::from_secs(5),
            active_delay: Duration::from_secs(1),
            watchdog_interval: Duration::from_secs(5),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Where a run is once it has been submitted
enum Phase {
    Polling(FeedsRequest),
    Draining(FeedsRequest),
    Terminal(RunStatus),
}

/// Plays strategy runs of one scenario
///
/// Holds only immutable settings; every [`play`](Self::play) call owns the
/// state of its own run, so one player can launch many concurrent runs.
pub struct StrategyPlayer {
    client: Arc<dyn FacadeApi>,
    params: Arc<PlayParams>,
    /// Run time after which the server is asked to stop the run; zero disables it
    hard_deadline: Duration,
    /// Whether the final pull also fetches portfolio and risk grids
    include_grids: bool,
    timing: PollTiming,
    retry: RetryPolicy,
}

impl StrategyPlayer {
    /// Creates a player with default timing and unbounded retries
    pub fn new(
        client: Arc<dyn FacadeApi>,
        params: Arc<PlayParams>,
        hard_deadline: Duration,
        include_grids: bool,
    ) -> Self {
        Self {
            client,
            params,
            hard_deadline,
            include_grids,
            timing: PollTiming::default(),
            retry: RetryPolicy::forever(),
        }
    }

    #[cfg(test)]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Runs one strategy to its terminal status
    ///
    /// Never fails: transport problems are retried and everything else is
    /// folded into the returned status. The elapsed time is measured from the
    /// first submission attempt.
    pub async fn play(&self) -> RunOutcome {
        let started = Instant::now();

        let status = match self.submit().await {
            Some(run_id) => {
                let watchdog = self.spawn_watchdog(run_id, started);
                let status = self.poll_until_exit(run_id).await;
                if let Some(handle) = watchdog {
                    handle.abort();
                }
                status
            }
            None => RunStatus::Error,
        };

        RunOutcome::new(status, started.elapsed())
    }

    /// Submits the strategy, returning the run id assigned by the server
    async fn submit(&self) -> Option<RunId> {
        let client = self.client.as_ref();
        let params = self.params.as_ref();

        match self.retry.run("play", move || client.play(params)).await {
            Ok(PlayResponse::Started(run_id)) => {
                info!("Successfully started strategy with run-id={}", run_id);
                Some(run_id)
            }
            Ok(PlayResponse::Rejected(reason)) => {
                info!("Error running strategy: {}", reason);
                None
            }
            Err(e) => {
                warn!("Giving up submitting strategy: {}", e);
                None
            }
        }
    }

    async fn poll_until_exit(&self, run_id: RunId) -> RunStatus {
        let mut phase = Phase::Polling(FeedsRequest::initial(run_id, self.timing.page_size));

        loop {
            phase = match phase {
                Phase::Polling(request) => {
                    let returns = match self.pull(&request).await {
                        Some(returns) => returns,
                        None => return RunStatus::Error,
                    };
                    self.on_feeds(request, returns).await
                }
                Phase::Draining(request) => {
                    match self.pull(&request).await {
                        Some(returns) => debug!(
                            "Drained {} remaining feed(s) for run-id <{}>",
                            returns.feed_count(),
                            run_id
                        ),
                        None => warn!("Final pull for run-id <{}> failed", run_id),
                    }
                    Phase::Terminal(RunStatus::Success)
                }
                Phase::Terminal(status) => return status,
            };
        }
    }

    /// Decides what follows a pull response of a running strategy
    async fn on_feeds(&self, request: FeedsRequest, returns: FeedsReturns) -> Phase {
        let lifecycle = returns.lifecycle();

        match lifecycle.terminal() {
            Some(RunStatus::Success) => {
                Phase::Draining(request.drain_request(&returns, self.include_grids))
            }
            Some(status) => {
                info!(
                    "Execution of run-id <{}> interrupted due to: {}",
                    request.run_id(),
                    lifecycle
                );
                Phase::Terminal(status)
            }
            None => {
                let next = request.next_request(&returns);
                let delay = if next == request {
                    self.timing.idle_delay
                } else {
                    self.timing.active_delay
                };
                time::sleep(delay).await;
                Phase::Polling(next)
            }
        }
    }

    /// Pulls feeds, `None` when the run has to end as an error
    async fn pull(&self, request: &FeedsRequest) -> Option<FeedsReturns> {
        let client = self.client.as_ref();

        match self.retry.run("pull", move || client.pull(request)).await {
            Ok(returns) => {
                debug!(
                    "Received feeds for run-id <{}>: status={:?}, {} feed(s)",
                    request.run_id(),
                    returns.status,
                    returns.feed_count()
                );
                Some(returns)
            }
            Err(e) => {
                warn!("Pull for run-id <{}> failed: {}", request.run_id(), e);
                None
            }
        }
    }

    /// Starts the hard-deadline watchdog, `None` when the deadline is disabled
    fn spawn_watchdog(&self, run_id: RunId, started: Instant) -> Option<JoinHandle<()>> {
        if self.hard_deadline.is_zero() {
            return None;
        }

        let client = Arc::clone(&self.client);
        let deadline = self.hard_deadline;
        let retry = self.retry;
        let mut ticker = time::interval(self.timing.watchdog_interval);

        Some(tokio::spawn(async move {
            loop {
                ticker.tick().await;
                debug!("Still waiting: {}", run_id);

                if started.elapsed() > deadline {
                    warn!(
                        "Strategy run-id={} runs over hard deadline, canceling...",
                        run_id
                    );
                    tokio::spawn(send_stop(client, retry, run_id));
                    return;
                }
            }
        }))
    }
}

/// Best-effort cancellation of one run
async fn send_stop(client: Arc<dyn FacadeApi>, retry: RetryPolicy, run_id: RunId) {
    let api = client.as_ref();
    if let Err(e) = retry.run("stop", move || api.stop(run_id)).await {
        warn!("Failed to stop run-id={}: {}", run_id, e);
    }
}

#[async_trait]
impl RunLauncher for StrategyPlayer {
    async fn launch(&self) -> RunOutcome {
        self.play().await
    }
}
