mod cli;
mod consts;
mod orchestrator;
mod records;
mod table;
mod workload;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use apibench_core::Target;
use apibench_storage::{Config, Report, RunSettings};
use clap::Parser;
use console::style;
use indicatif::{MultiProgress, ProgressDrawTarget};
use mimalloc::MiMalloc;
use tracing::{info, warn};

use crate::orchestrator::WorkloadOrchestrator;
use crate::workload::{WorkloadPlan, default_endpoints};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(
            match tracing_subscriber::EnvFilter::try_from_default_env() {
                Ok(filter) => filter,
                Err(_) => tracing_subscriber::EnvFilter::new("info"),
            },
        )
        .init();
    let args = cli::Args::parse();

    match args.command {
        cli::Commands::Run {
            targets,
            requests,
            concurrency,
            output,
            chart,
            config,
            seed_max_id,
            timeout,
            wait_ready,
            quiet,
        } => {
            let config = config.as_deref().map(Config::load).transpose()?;
            let overrides = config.as_ref().map(|c| c.settings().clone()).unwrap_or_default();

            let targets = resolve_targets(targets, config.as_ref());
            let endpoints = match config.as_ref().map(|c| c.endpoints()) {
                Some(endpoints) if !endpoints.is_empty() => endpoints.to_vec(),
                _ => default_endpoints(),
            };
            let settings = RunSettings {
                total_requests: requests
                    .or(overrides.requests)
                    .unwrap_or(consts::DEFAULT_REQUESTS),
                concurrency: concurrency
                    .or(overrides.concurrency)
                    .unwrap_or(consts::DEFAULT_CONCURRENCY),
                seed_max_id: seed_max_id
                    .or(overrides.seed_max_id)
                    .unwrap_or(consts::DEFAULT_SEED_MAX_ID),
                request_timeout_secs: timeout
                    .or(overrides.timeout_secs)
                    .unwrap_or(consts::DEFAULT_REQUEST_TIMEOUT_SECS),
            };
            let output = output.unwrap_or_else(|| PathBuf::from(consts::DEFAULT_OUTPUT));

            run(targets, endpoints, settings, Duration::from_secs(wait_ready), quiet, &output, chart.as_deref())
                .await?;
        }
        cli::Commands::Show { report } => {
            let report = Report::load(&report)
                .with_context(|| format!("Failed to read report {}", report.display()))?;
            table::write_report(&mut std::io::stdout().lock(), &report)?;
        }
    }

    Ok(())
}

/// CLI targets win; otherwise the workload file's, otherwise the built-in pair.
fn resolve_targets(cli_targets: Vec<Target>, config: Option<&Config>) -> Vec<Target> {
    if !cli_targets.is_empty() {
        return cli_targets;
    }
    if let Some(config) = config
        && !config.targets().is_empty()
    {
        return config.targets().to_vec();
    }
    consts::DEFAULT_TARGETS
        .iter()
        .map(|(name, url)| Target::new(*name, *url))
        .collect()
}

async fn run(
    targets: Vec<Target>,
    endpoints: Vec<apibench_core::EndpointSpec>,
    settings: RunSettings,
    wait_ready: Duration,
    quiet: bool,
    output: &Path,
    chart: Option<&Path>,
) -> anyhow::Result<()> {
    let plan = WorkloadPlan::new(endpoints);
    println!(
        "{} Comparing {} targets on {} endpoints, {} requests @ {} concurrent",
        style("▶").cyan(),
        targets.len(),
        plan.endpoint_count(),
        settings.total_requests,
        settings.concurrency
    );
    for target in &targets {
        println!("  {}", target);
    }

    let progress = if quiet {
        MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
    } else {
        MultiProgress::new()
    };

    let outcome = WorkloadOrchestrator::new(targets, plan, settings.clone())?
        .with_progress(progress)
        .with_wait_ready(wait_ready)
        .run()
        .await?;

    for cleanup in &outcome.cleanup {
        if cleanup.listing_failed || !cleanup.failed.is_empty() {
            warn!(
                "{}: cleanup incomplete, {} records could not be deleted",
                cleanup.target,
                cleanup.failed.len()
            );
        }
    }

    let report = Report::new(
        settings,
        outcome.targets,
        outcome.unavailable,
        outcome.results,
        outcome.comparisons,
    );
    table::write_report(&mut std::io::stdout().lock(), &report)?;

    report
        .save(output)
        .with_context(|| format!("Failed to write report {}", output.display()))?;
    if let Some(chart) = chart {
        report
            .chart_data()
            .save(chart)
            .with_context(|| format!("Failed to write chart data {}", chart.display()))?;
    }
    info!("Run {} complete", report.run_id);
    Ok(())
}
