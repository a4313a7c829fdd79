//! Test scenario descriptor
//!
//! Everything needed to stress one strategy: how to start it, how long a run
//! may take, how the baseline is measured, and how the pass controller moves.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use stress_core::dto::play::PlayParams;

use crate::service::ControllerSettings;

/// One enabled scenario from the config file
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub play_params: Arc<PlayParams>,
    /// Run time after which a run is asked to stop; zero never stops runs
    pub timeout_to_kill: Duration,
    /// Sequential runs used to measure the unloaded duration
    pub num_initial_speed_test_runs: u32,
    /// Whether the final pull of a run also fetches the grid channels
    pub pull_grids: bool,
    pub controller: ControllerSettings,
}

impl TestScenario {
    /// Executors of the first pass, never above the theoretical upper bound
    pub fn initial_parallels(&self) -> i64 {
        self.controller.initial_parallels
    }
}

impl fmt::Display for TestScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{} {}..{}, timeout {} ms, {} speed test runs, initial {} executors, upper bound {}]",
            self.name,
            self.play_params.language,
            self.play_params.start_date,
            self.play_params.end_date,
            self.timeout_to_kill.as_millis(),
            self.num_initial_speed_test_runs,
            self.initial_parallels(),
            self.controller.theoretical_upper_bound
        )
    }
}
