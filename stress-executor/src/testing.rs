//! In-memory fakes shared by the unit tests

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use stress_client::{ClientError, FacadeApi};
use stress_core::domain::RunId;
use stress_core::domain::feeds::{FeedChannel, FeedSlice, FeedsRequest, FeedsReturns};
use stress_core::domain::status::{RunOutcome, RunStatus};
use stress_core::dto::play::{PlayParams, PlayResponse};
use tokio::time::{Duration, Instant};

use crate::scheduler::RunLauncher;

/// A transport-level error, built without touching the network
pub fn transport_error() -> ClientError {
    let err = reqwest::Client::new()
        .get("not a url")
        .build()
        .expect_err("invalid url must not build");
    ClientError::RequestFailed(err)
}

/// Pull returns with a lifecycle status and per-channel next indices
pub fn feeds(status: &str, next: &[(FeedChannel, i64)]) -> FeedsReturns {
    FeedsReturns {
        status: Some(status.to_string()),
        slices: next
            .iter()
            .map(|&(channel, next_index)| {
                (
                    channel,
                    FeedSlice {
                        next_index: Some(next_index),
                        feeds: Vec::new(),
                    },
                )
            })
            .collect(),
    }
}

/// A pull the fake received, with the (paused) clock time it arrived
#[derive(Debug, Clone)]
pub struct RecordedPull {
    pub request: FeedsRequest,
    pub at: Instant,
}

/// Facade answering from scripted queues
///
/// Play defaults to `Started(1)` and pull defaults to `NormalExit` once the
/// scripts run dry.
#[derive(Default)]
pub struct ScriptedFacade {
    plays: Mutex<VecDeque<Result<PlayResponse, ClientError>>>,
    pull_script: Mutex<VecDeque<Result<FeedsReturns, ClientError>>>,
    play_calls: AtomicUsize,
    pulls: Mutex<Vec<RecordedPull>>,
    stops: Mutex<Vec<RunId>>,
    stop_all_calls: AtomicUsize,
    stop_all_failures: AtomicUsize,
}

impl ScriptedFacade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_play(&self, response: Result<PlayResponse, ClientError>) {
        self.plays.lock().unwrap().push_back(response);
    }

    pub fn push_pull(&self, response: Result<FeedsReturns, ClientError>) {
        self.pull_script.lock().unwrap().push_back(response);
    }

    /// Makes the next `n` stop-all commands fail with a rejection
    pub fn fail_stop_all(&self, n: usize) {
        self.stop_all_failures.store(n, Ordering::SeqCst);
    }

    pub fn play_calls(&self) -> usize {
        self.play_calls.load(Ordering::SeqCst)
    }

    pub fn pulls(&self) -> Vec<RecordedPull> {
        self.pulls.lock().unwrap().clone()
    }

    pub fn stops(&self) -> Vec<RunId> {
        self.stops.lock().unwrap().clone()
    }

    pub fn stop_all_calls(&self) -> usize {
        self.stop_all_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FacadeApi for ScriptedFacade {
    async fn play(&self, _params: &PlayParams) -> Result<PlayResponse, ClientError> {
        self.play_calls.fetch_add(1, Ordering::SeqCst);
        self.plays
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(PlayResponse::Started(1)))
    }

    async fn pull(&self, request: &FeedsRequest) -> Result<FeedsReturns, ClientError> {
        self.pulls.lock().unwrap().push(RecordedPull {
            request: request.clone(),
            at: Instant::now(),
        });
        self.pull_script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(feeds("NormalExit", &[])))
    }

    async fn stop(&self, run_id: RunId) -> Result<(), ClientError> {
        self.stops.lock().unwrap().push(run_id);
        Ok(())
    }

    async fn stop_all(&self) -> Result<(), ClientError> {
        self.stop_all_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.stop_all_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.stop_all_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(ClientError::rejected(Some(1), "{\"status\":1}"));
        }
        Ok(())
    }
}

/// Launcher replaying a fixed list of outcomes, then succeeding in 1ms
#[derive(Default)]
pub struct ScriptedLauncher {
    outcomes: Mutex<VecDeque<RunOutcome>>,
    launched: AtomicUsize,
}

impl ScriptedLauncher {
    pub fn new(outcomes: impl IntoIterator<Item = (RunStatus, u64)>) -> Self {
        Self {
            outcomes: Mutex::new(
                outcomes
                    .into_iter()
                    .map(|(status, millis)| RunOutcome::new(status, Duration::from_millis(millis)))
                    .collect(),
            ),
            launched: AtomicUsize::new(0),
        }
    }

    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RunLauncher for ScriptedLauncher {
    async fn launch(&self) -> RunOutcome {
        self.launched.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(RunOutcome::new(RunStatus::Success, Duration::from_millis(1)))
    }
}

/// Launcher emulating a server that can only serve `capacity` runs at once
///
/// Every run takes `run_time`; runs started while the server is full are
/// canceled.
pub struct CapacityLauncher {
    capacity: usize,
    run_time: Duration,
    in_flight: AtomicUsize,
    launched: AtomicUsize,
}

impl CapacityLauncher {
    pub fn new(capacity: usize, run_time: Duration) -> Self {
        Self {
            capacity,
            run_time,
            in_flight: AtomicUsize::new(0),
            launched: AtomicUsize::new(0),
        }
    }

    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RunLauncher for CapacityLauncher {
    async fn launch(&self) -> RunOutcome {
        self.launched.fetch_add(1, Ordering::SeqCst);
        let load = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.run_time).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let status = if load > self.capacity {
            RunStatus::Canceled
        } else {
            RunStatus::Success
        };
        RunOutcome::new(status, self.run_time)
    }
}
