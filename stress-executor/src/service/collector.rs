//! Pass result collector
//!
//! Collects the outcomes of all runs started in one pass and turns them into
//! a single verdict. Runs finish concurrently, so every counter is atomic and
//! the verdict is sent by whichever delivery brings the received count to the
//! expected count.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use stress_core::domain::status::{RunOutcome, RunStatus};
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Final result of one pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassVerdict {
    /// True when the share of normal runs reached the required ratio
    pub success: bool,
    /// Normal runs divided by received runs, in `[0, 1]`
    pub success_ratio: f64,
    /// Mean duration of the normal runs, 0 when there were none
    pub average_millis: f64,
    pub received: usize,
    /// Runs that failed, were canceled, or succeeded over the threshold
    pub overtime: usize,
}

impl PassVerdict {
    /// Verdict of a pass that could not start a single run
    pub fn no_runs() -> Self {
        Self {
            success: false,
            success_ratio: 0.0,
            average_millis: 0.0,
            received: 0,
            overtime: 0,
        }
    }
}

/// Accumulates the outcomes of one pass
pub struct ResultCollector {
    expected: usize,
    /// Successful runs slower than this count as overtime
    overtime_threshold_millis: f64,
    /// Minimum share of normal runs for the pass to succeed
    lowest_normal_ratio: f64,
    received: AtomicUsize,
    overtime: AtomicUsize,
    total_normal_millis: AtomicU64,
    verdict_tx: Mutex<Option<oneshot::Sender<PassVerdict>>>,
}

impl ResultCollector {
    /// Creates a collector and the receiver its verdict is sent to
    ///
    /// # Arguments
    /// * `overtime_threshold_millis` - successful runs beyond this are overtime
    /// * `expected` - number of runs started in the pass
    /// * `lowest_normal_ratio` - ratio in `(0, 1]` a pass needs to succeed
    pub fn new(
        overtime_threshold_millis: f64,
        expected: usize,
        lowest_normal_ratio: f64,
    ) -> (Arc<Self>, oneshot::Receiver<PassVerdict>) {
        let (tx, rx) = oneshot::channel();
        let collector = Arc::new(Self {
            expected,
            overtime_threshold_millis,
            lowest_normal_ratio,
            received: AtomicUsize::new(0),
            overtime: AtomicUsize::new(0),
            total_normal_millis: AtomicU64::new(0),
            verdict_tx: Mutex::new(Some(tx)),
        });
        (collector, rx)
    }

    /// Records one terminal run
    ///
    /// Returns true for the delivery that completed the pass and sent the
    /// verdict; deliveries beyond the expected count are ignored.
    pub fn accept(&self, outcome: RunOutcome) -> bool {
        let millis = outcome.elapsed_millis();

        match outcome.status {
            RunStatus::Canceled => {
                info!("Strategy execution canceled, running time is: {}", millis);
                self.overtime.fetch_add(1, Ordering::SeqCst);
            }
            RunStatus::Error => {
                info!("Strategy execution error, running time is: {}", millis);
                self.overtime.fetch_add(1, Ordering::SeqCst);
            }
            RunStatus::Success if millis as f64 > self.overtime_threshold_millis => {
                info!(
                    "Strategy execution normally exited but overdue. Threshold is: {}, running time is: {}",
                    self.overtime_threshold_millis, millis
                );
                self.overtime.fetch_add(1, Ordering::SeqCst);
            }
            RunStatus::Success => {
                info!("Strategy execution normally exited, running time is: {}", millis);
                self.total_normal_millis.fetch_add(millis, Ordering::SeqCst);
            }
        }

        let received = self.received.fetch_add(1, Ordering::SeqCst) + 1;
        if received > self.expected {
            warn!(
                "Ignoring run result beyond the {} expected in this pass",
                self.expected
            );
            return false;
        }
        if received < self.expected {
            return false;
        }

        let verdict = self.verdict(received);
        let tx = self
            .verdict_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = tx {
            if tx.send(verdict).is_err() {
                warn!("Pass verdict dropped: nobody is waiting for it");
            }
        }
        true
    }

    fn verdict(&self, received: usize) -> PassVerdict {
        let overtime = self.overtime.load(Ordering::SeqCst).min(received);
        let normals = received - overtime;
        let success_ratio = if received == 0 {
            0.0
        } else {
            normals as f64 / received as f64
        };
        let average_millis = if normals == 0 {
            0.0
        } else {
            self.total_normal_millis.load(Ordering::SeqCst) as f64 / normals as f64
        };

        PassVerdict {
            success: success_ratio >= self.lowest_normal_ratio,
            success_ratio,
            average_millis,
            received,
            overtime,
        }
    }
}
