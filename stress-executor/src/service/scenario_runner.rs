//! Scenario runner
//!
//! Measures the baseline of one scenario and then stresses the server with
//! the pass controller. A scenario without a baseline never starts a pass.

use std::fmt;
use std::sync::Arc;

use stress_client::FacadeApi;
use tracing::{error, info};

use super::controller::{BestStatus, StressController};
use super::speed::SpeedDecider;
use crate::scenario::TestScenario;
use crate::scheduler::{RunLauncher, StrategyPlayer};

/// Final result of one scenario
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScenarioReport {
    /// No baseline could be measured; no pass was run
    BaselineFailed,
    /// Best passing executor count and its average run time
    Finished(BestStatus),
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScenarioReport::BaselineFailed => write!(f, "failed to determine single strategy speed"),
            ScenarioReport::Finished(best) => write!(
                f,
                "number of strategies ran: {}, average time taken for each run: {} milliseconds",
                best.executors, best.average_millis
            ),
        }
    }
}

/// Runs one scenario to completion
pub struct ScenarioRunner {
    scenario: TestScenario,
    launcher: Arc<dyn RunLauncher>,
}

impl ScenarioRunner {
    /// Creates a runner playing the scenario's strategy through `client`
    pub fn new(scenario: TestScenario, client: Arc<dyn FacadeApi>) -> Self {
        let player = StrategyPlayer::new(
            client,
            Arc::clone(&scenario.play_params),
            scenario.timeout_to_kill,
            scenario.pull_grids,
        );
        Self::with_launcher(scenario, Arc::new(player))
    }

    /// Creates a runner starting runs through any launcher
    pub fn with_launcher(scenario: TestScenario, launcher: Arc<dyn RunLauncher>) -> Self {
        Self { scenario, launcher }
    }

    pub async fn run(&self) -> ScenarioReport {
        info!("Running scenario: {}", self.scenario);
        info!("Determining single strategy average execution...");

        let decider = SpeedDecider::new(self.scenario.num_initial_speed_test_runs);
        let Some(baseline) = decider.decide(self.launcher.as_ref()).await else {
            error!(
                "Failed to determine the initial speed of the strategy, stop scenario: {}",
                self.scenario
            );
            return ScenarioReport::BaselineFailed;
        };
        info!(
            "Single strategy average execution time is: {} milliseconds",
            baseline
        );

        let controller =
            StressController::new(self.scenario.controller, Arc::clone(&self.launcher));
        let best = controller.run(baseline).await;

        let report = ScenarioReport::Finished(best);
        info!("Scenario <{}> finished: {}", self.scenario.name, report);
        report
    }
}
