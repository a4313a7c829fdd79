//! Stress tester configuration
//!
//! Loaded from a YAML file holding the facade server connection and the
//! scenarios to run. Scenario-wide controller knobs live next to the list of
//! scenarios; each scenario names its strategy file and backtest window.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use stress_core::dto::play::PlayParams;
use tracing::warn;

use crate::scenario::TestScenario;
use crate::service::ControllerSettings;

/// Stress tester configuration file
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub scenarios: ScenariosConfig,

    /// Directory strategy paths are resolved against when not found as given
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Facade server connection
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Facade endpoint (e.g., "http://localhost:8080/facade")
    pub url: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Controller knobs shared by every scenario, plus the scenarios themselves
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScenariosConfig {
    pub expand_grow_factor: f64,
    pub refine_grow_factor: f64,
    pub refine_shrink_factor: f64,
    pub overtime_tolerance_multiplier: f64,
    pub initial_parallel_runs: i64,
    pub max_refine_runs: u32,
    pub success_tolerance_percentage: f64,
    pub theoretical_upper_bound: i64,
    #[serde(default)]
    pub compat_recursion: bool,
    #[serde(default)]
    pub scenario: Vec<ScenarioConfig>,
}

/// One scenario entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScenarioConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub title: String,
    /// Strategy source file
    pub strategy: PathBuf,
    pub start_date: u32,
    pub end_date: u32,
    pub initial_cash: f64,
    pub bar_type: BarType,
    pub timeout_millis: u64,
    pub num_initial_speed_test_runs: u32,
    #[serde(default = "default_true")]
    pub pull_grids: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarType {
    Day,
    Minute,
}

impl BarType {
    /// Time unit sent with the play command
    pub fn time_unit(&self) -> &'static str {
        match self {
            BarType::Day => "d",
            BarType::Minute => "m",
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Reads and validates a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if !self.server.url.starts_with("http://") && !self.server.url.starts_with("https://") {
            anyhow::bail!("server url must start with http:// or https://");
        }

        if self.server.username.is_empty() {
            anyhow::bail!("server username cannot be empty");
        }

        let s = &self.scenarios;
        for (name, factor) in [
            ("expand-grow-factor", s.expand_grow_factor),
            ("refine-grow-factor", s.refine_grow_factor),
            ("refine-shrink-factor", s.refine_shrink_factor),
        ] {
            if !(factor > 0.0) {
                anyhow::bail!("{} must be greater than 0", name);
            }
        }

        if !(s.overtime_tolerance_multiplier >= 1.0) {
            anyhow::bail!("overtime-tolerance-multiplier must be at least 1");
        }

        if !(s.success_tolerance_percentage > 0.0 && s.success_tolerance_percentage <= 1.0) {
            anyhow::bail!("success-tolerance-percentage must be in (0, 1]");
        }

        if s.theoretical_upper_bound < 1 {
            anyhow::bail!("theoretical-upper-bound must be at least 1");
        }

        if s.initial_parallel_runs < 1 {
            anyhow::bail!("initial-parallel-runs must be at least 1");
        }

        for scenario in &s.scenario {
            if scenario.title.is_empty() {
                anyhow::bail!("scenario title cannot be empty");
            }
            if scenario.num_initial_speed_test_runs == 0 {
                anyhow::bail!(
                    "scenario '{}': num-initial-speed-test-runs must be at least 1",
                    scenario.title
                );
            }
        }

        Ok(())
    }

    /// Controller settings shared by every scenario
    pub fn controller_settings(&self) -> ControllerSettings {
        let s = &self.scenarios;
        ControllerSettings {
            initial_parallels: s.initial_parallel_runs.min(s.theoretical_upper_bound),
            theoretical_upper_bound: s.theoretical_upper_bound,
            expand_grow_factor: s.expand_grow_factor,
            refine_grow_factor: s.refine_grow_factor,
            refine_shrink_factor: s.refine_shrink_factor,
            overtime_tolerance_multiplier: s.overtime_tolerance_multiplier,
            success_tolerance_percentage: s.success_tolerance_percentage,
            max_refine_runs: s.max_refine_runs,
            compat_recursion: s.compat_recursion,
        }
    }

    /// Builds the enabled scenarios, in file order
    ///
    /// Fails when a strategy file cannot be found; a strategy that exists but
    /// cannot be read is skipped with a warning.
    pub fn list_scenarios(&self) -> Result<Vec<TestScenario>> {
        let controller = self.controller_settings();
        let mut scenarios = Vec::new();

        for scenario in self.scenarios.scenario.iter().filter(|s| s.enabled) {
            let strategy = self.resolve_strategy(&scenario.strategy)?;
            let code = match std::fs::read_to_string(&strategy) {
                Ok(code) => code,
                Err(e) => {
                    warn!(
                        "Skipping scenario '{}': cannot read strategy {}: {}",
                        scenario.title,
                        strategy.display(),
                        e
                    );
                    continue;
                }
            };

            let params = PlayParams {
                code,
                owner: self.server.username.clone(),
                title: scenario.title.clone(),
                time_unit: scenario.bar_type.time_unit().to_string(),
                language: language_of(&scenario.strategy).to_string(),
                start_date: scenario.start_date,
                end_date: scenario.end_date,
                initial_cash: scenario.initial_cash,
                run_type: "backtest".to_string(),
                portfolio_name: Some("p".to_string()),
                benchmark_name: Some("b".to_string()),
            };

            scenarios.push(TestScenario {
                name: scenario.title.clone(),
                play_params: Arc::new(params),
                timeout_to_kill: Duration::from_millis(scenario.timeout_millis),
                num_initial_speed_test_runs: scenario.num_initial_speed_test_runs,
                pull_grids: scenario.pull_grids,
                controller,
            });
        }

        Ok(scenarios)
    }

    /// Looks the strategy up as given, then next to the config file
    fn resolve_strategy(&self, strategy: &Path) -> Result<PathBuf> {
        if strategy.exists() {
            return Ok(strategy.to_path_buf());
        }

        let relative = self.base_dir.join(strategy);
        if relative.exists() {
            return Ok(relative);
        }

        anyhow::bail!("Unable to find strategy file: {}", strategy.display())
    }
}

/// Python when the file name ends in "py", java otherwise
fn language_of(strategy: &Path) -> &'static str {
    if strategy.to_string_lossy().ends_with("py") {
        "python"
    } else {
        "java"
    }
}
