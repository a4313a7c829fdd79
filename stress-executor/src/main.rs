//! Stress Tester
//!
//! Finds how many strategies a facade server can run at once.
//!
//! Architecture:
//! - Configuration: YAML file with the server and the scenarios to run
//! - Scheduler: plays one strategy run from submission to terminal status
//! - Services: baseline measurement, pass collection and the pass controller
//!
//! Every enabled scenario is run in turn: a few sequential runs measure the
//! unloaded speed of the strategy, then passes of concurrent runs grow or
//! shrink until the refine budget is spent. The best passing executor count
//! of each scenario is logged as its report.

mod config;
mod scenario;
mod scheduler;
mod service;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::service::{ScenarioReport, ScenarioRunner};
use stress_client::{FacadeApi, FacadeClient, RetryPolicy};

#[derive(Parser)]
#[command(name = "stress-tester")]
#[command(about = "Adaptive stress tester for the strategy facade", long_about = None)]
struct Cli {
    /// Path to the YAML config file
    #[arg(short, long, env = "STRESS_TEST_CONFIG")]
    config: PathBuf,

    /// Seconds to wait for the server to accept stop-all before giving up
    #[arg(long, default_value_t = 30)]
    cleanup_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stress_executor=info,stress_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    info!("Starting Stress Tester");

    let config = Config::load(&cli.config).context("Failed to load configuration")?;
    info!(
        "Loaded configuration: server={}, username={}",
        config.server.url, config.server.username
    );

    let scenarios = config
        .list_scenarios()
        .context("Failed to build scenarios")?;
    info!("{} scenario(s) enabled", scenarios.len());

    let client: Arc<dyn FacadeApi> = Arc::new(
        FacadeClient::new(
            config.server.url.clone(),
            config.server.username.clone(),
            config.server.password.clone(),
        )
        .context("Failed to build facade client")?,
    );

    clean_environment(client.as_ref(), Duration::from_secs(cli.cleanup_timeout_secs)).await?;

    let mut reports = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let name = scenario.name.clone();
        let report = ScenarioRunner::new(scenario, Arc::clone(&client))
            .run()
            .await;
        reports.push((name, report));
    }

    info!("All scenarios finished");
    for (name, report) in &reports {
        match report {
            ScenarioReport::BaselineFailed => error!("  - {}: {}", name, report),
            ScenarioReport::Finished(_) => info!("  - {}: {}", name, report),
        }
    }

    Ok(())
}

/// Stops every run left on the server by earlier sessions
///
/// Stop-all is re-sent until the server accepts it, for at most `timeout`.
async fn clean_environment(client: &dyn FacadeApi, timeout: Duration) -> Result<()> {
    info!("Cleaning environment");

    let policy = RetryPolicy::forever();
    let stop_all = policy.run_until_ok("stop-all", move || client.stop_all());
    match tokio::time::timeout(timeout, stop_all).await {
        Ok(Ok(())) => {
            info!("Environment cleaned");
            Ok(())
        }
        Ok(Err(e)) => {
            error!("Unable to clean environment: {}", e);
            Err(anyhow::anyhow!("Unable to clean environment: {}", e))
        }
        Err(_) => {
            error!("Unable to clean environment within {:?}", timeout);
            Err(anyhow::anyhow!(
                "Unable to clean environment within {:?}",
                timeout
            ))
        }
    }
}
