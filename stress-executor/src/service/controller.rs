//! Stress controller
//!
//! Runs successive passes of concurrent strategies and adapts the number of
//! executors between them:
//!
//! - a successful pass grows the count, fast while no pass has failed yet
//!   (expanding) and slower afterwards (refining), by at least 2;
//! - a failed pass shrinks it by at least 1 and switches to refining for good.
//!
//! Passes while still expanding are free; once refining, every pass spends
//! one unit of the refine budget. A successful pass already at the upper
//! bound cannot grow any further, so it is charged as well. The best passing
//! executor count found is the result.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::collector::{PassVerdict, ResultCollector};
use crate::scheduler::RunLauncher;

/// Knobs of the pass controller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerSettings {
    /// Executors of the first pass, already bounded by the upper bound
    pub initial_parallels: i64,
    /// Ceiling the executor count is clamped to after growing
    pub theoretical_upper_bound: i64,
    pub expand_grow_factor: f64,
    pub refine_grow_factor: f64,
    pub refine_shrink_factor: f64,
    /// Successful runs slower than `baseline * multiplier` count as overtime
    pub overtime_tolerance_multiplier: f64,
    /// Share of normal runs a pass needs to succeed
    pub success_tolerance_percentage: f64,
    pub max_refine_runs: u32,
    /// Simpler recursion: no clamp, plain best update, every pass is counted
    pub compat_recursion: bool,
}

/// Best passing configuration seen so far
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestStatus {
    pub executors: i64,
    pub average_millis: f64,
}

/// State carried from one pass to the next
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerState {
    pub executors: i64,
    pub best: BestStatus,
    /// Sticky: once a pass failed, growth uses the refine factor
    pub has_failed_before: bool,
    /// Passes charged against `max_refine_runs`
    pub pass_index: u32,
}

impl ControllerState {
    pub fn initial(executors: i64) -> Self {
        Self {
            executors,
            best: BestStatus {
                executors: 0,
                average_millis: 0.0,
            },
            has_failed_before: false,
            pass_index: 0,
        }
    }

    pub fn is_exhausted(&self, settings: &ControllerSettings) -> bool {
        self.pass_index >= settings.max_refine_runs
    }

    /// State for the next pass given the verdict of the current one
    pub fn advance(self, settings: &ControllerSettings, verdict: &PassVerdict) -> Self {
        let k = self.executors;

        if verdict.success {
            let factor = if self.has_failed_before {
                settings.refine_grow_factor
            } else {
                settings.expand_grow_factor
            };
            let mut next = scale(k, factor);
            if next <= k + 1 {
                next = k + 2;
            }
            if !settings.compat_recursion {
                next = next.min(settings.theoretical_upper_bound);
            }

            let best = if settings.compat_recursion || self.improves_best(k, verdict.average_millis)
            {
                BestStatus {
                    executors: k,
                    average_millis: verdict.average_millis,
                }
            } else {
                self.best
            };

            let at_ceiling = k >= settings.theoretical_upper_bound;
            let charged = settings.compat_recursion || self.has_failed_before || at_ceiling;

            Self {
                executors: next,
                best,
                has_failed_before: self.has_failed_before,
                pass_index: self.pass_index + u32::from(charged),
            }
        } else {
            let mut next = scale(k, settings.refine_shrink_factor);
            if next == k {
                next = k - 1;
            }

            Self {
                executors: next,
                best: self.best,
                has_failed_before: true,
                pass_index: self.pass_index + 1,
            }
        }
    }

    /// More executors win; equal counts only win with a strictly lower average
    fn improves_best(&self, executors: i64, average_millis: f64) -> bool {
        executors > self.best.executors
            || (executors == self.best.executors && average_millis < self.best.average_millis)
    }
}

/// `executors * factor`, rounded down
fn scale(executors: i64, factor: f64) -> i64 {
    (executors as f64 * factor).floor() as i64
}

/// Drives the passes of one scenario
pub struct StressController {
    settings: ControllerSettings,
    launcher: Arc<dyn RunLauncher>,
}

impl StressController {
    pub fn new(settings: ControllerSettings, launcher: Arc<dyn RunLauncher>) -> Self {
        Self { settings, launcher }
    }

    /// Runs passes until the refine budget is spent
    ///
    /// # Arguments
    /// * `unstressed_millis` - baseline duration of a single strategy
    ///
    /// # Returns
    /// The best passing executor count and its average run time
    pub async fn run(&self, unstressed_millis: f64) -> BestStatus {
        let threshold = unstressed_millis * self.settings.overtime_tolerance_multiplier;
        let mut state = ControllerState::initial(self.settings.initial_parallels);

        while !state.is_exhausted(&self.settings) {
            let verdict = self.run_pass(state.executors, threshold).await;
            info!("Pass finished, number of executors={}", state.executors);

            let next = state.advance(&self.settings, &verdict);
            if verdict.success {
                info!(
                    "Pass success, grow number of executors from {} to {}. Average time: {}",
                    state.executors, next.executors, verdict.average_millis
                );
            } else {
                info!(
                    "Pass failed, shrink number of executors from {} to {}. Average time: {}",
                    state.executors, next.executors, verdict.average_millis
                );
            }
            state = next;
        }

        state.best
    }

    /// Runs `executors` strategies concurrently and waits for the verdict
    pub async fn run_pass(&self, executors: i64, threshold_millis: f64) -> PassVerdict {
        if executors <= 0 {
            warn!(
                "Pass with {} executors cannot start any run, counting it as failed",
                executors
            );
            return PassVerdict::no_runs();
        }

        let count = executors as usize;
        let (collector, verdict_rx) = ResultCollector::new(
            threshold_millis,
            count,
            self.settings.success_tolerance_percentage,
        );

        info!("Starting pass with {} executors", count);
        for _ in 0..count {
            let launcher = Arc::clone(&self.launcher);
            let collector = Arc::clone(&collector);
            tokio::spawn(async move {
                collector.accept(launcher.launch().await);
            });
        }
        drop(collector);

        match verdict_rx.await {
            Ok(verdict) => verdict,
            Err(_) => {
                error!("Pass of {} executors ended without a verdict", count);
                PassVerdict::no_runs()
            }
        }
    }
}
