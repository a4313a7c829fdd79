//! Single strategy speed decider
//!
//! Measures how long one strategy takes on an otherwise idle server by
//! running it a few times back to back. The average becomes the baseline
//! that pass thresholds are derived from.

use tracing::{info, warn};

use crate::scheduler::RunLauncher;

/// Sequential baseline measurement
pub struct SpeedDecider {
    /// How many successful runs to average over
    trial_limit: u32,
}

impl SpeedDecider {
    pub fn new(trial_limit: u32) -> Self {
        Self { trial_limit }
    }

    /// Runs up to `trial_limit` strategies one after another
    ///
    /// Returns the mean duration in milliseconds. The first run that does not
    /// succeed stops the measurement: the mean of the runs that succeeded so
    /// far is returned, or `None` when none did.
    pub async fn decide(&self, launcher: &dyn RunLauncher) -> Option<f64> {
        if self.trial_limit == 0 {
            warn!("No speed test runs configured");
            return None;
        }

        let mut total_millis: u64 = 0;
        let mut runs: u32 = 0;

        while runs < self.trial_limit {
            let outcome = launcher.launch().await;

            if !outcome.status.is_success() {
                warn!(
                    "Speed test run {} ended with status {} after {} ms",
                    runs + 1,
                    outcome.status,
                    outcome.elapsed_millis()
                );
                return if runs == 0 {
                    None
                } else {
                    Some(total_millis as f64 / runs as f64)
                };
            }

            total_millis += outcome.elapsed_millis();
            runs += 1;
            info!(
                "Speed test run {}/{} took {} ms",
                runs,
                self.trial_limit,
                outcome.elapsed_millis()
            );
        }

        Some(total_millis as f64 / self.trial_limit as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedLauncher;
    use stress_core::domain::status::RunStatus;

    #[tokio::test]
    async fn test_average_of_all_trials() {
        let launcher = ScriptedLauncher::new([
            (RunStatus::Success, 100),
            (RunStatus::Success, 110),
            (RunStatus::Success, 105),
        ]);

        let baseline = SpeedDecider::new(3).decide(&launcher).await;

        assert_eq!(baseline, Some(105.0));
        assert_eq!(launcher.launched(), 3);
    }

    #[tokio::test]
    async fn test_first_trial_failure_has_no_baseline() {
        let launcher = ScriptedLauncher::new([(RunStatus::Error, 10), (RunStatus::Success, 100)]);

        let baseline = SpeedDecider::new(3).decide(&launcher).await;

        assert_eq!(baseline, None);
        assert_eq!(launcher.launched(), 1);
    }

    #[tokio::test]
    async fn test_later_failure_returns_partial_average() {
        let launcher = ScriptedLauncher::new([
            (RunStatus::Success, 100),
            (RunStatus::Success, 120),
            (RunStatus::Canceled, 5000),
        ]);

        let baseline = SpeedDecider::new(5).decide(&launcher).await;

        assert_eq!(baseline, Some(110.0));
        assert_eq!(launcher.launched(), 3);
    }

    #[tokio::test]
    async fn test_zero_trials_has_no_baseline() {
        let launcher = ScriptedLauncher::default();
        assert_eq!(SpeedDecider::new(0).decide(&launcher).await, None);
        assert_eq!(launcher.launched(), 0);
    }
}
