use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use anyhow::Context;
use apibench_core::{
    BenchmarkResult, ComparisonRow, EndpointBenchmarker, EndpointSpec, ExecutorConfig,
    HealthProber, Method, Phase, RequestExecutor, Target,
};
use apibench_storage::RunSettings;
use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::records::{CleanupReport, RecordClient};
use crate::workload::WorkloadPlan;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("no targets reachable")]
    NoTargets,
    #[error("duplicate target name '{0}'")]
    DuplicateTarget(String),
}

/// What a finished run hands to reporting.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Live targets in caller order
    pub targets: Vec<String>,
    pub unavailable: Vec<String>,
    pub results: BTreeMap<String, Vec<BenchmarkResult>>,
    pub comparisons: Vec<ComparisonRow>,
    pub cleanup: Vec<CleanupReport>,
}

/// Probes, drives every phase against every live target, then undoes writes.
pub struct WorkloadOrchestrator {
    targets: Vec<Target>,
    plan: WorkloadPlan,
    settings: RunSettings,
    wait_ready: Duration,
    benchmarker: EndpointBenchmarker,
    prober: HealthProber,
    records: RecordClient,
    progress: MultiProgress,
}

impl WorkloadOrchestrator {
    pub fn new(targets: Vec<Target>, plan: WorkloadPlan, settings: RunSettings) -> anyhow::Result<Self> {
        let mut seen = HashSet::new();
        for target in &targets {
            if !seen.insert(target.name.as_str()) {
                return Err(RunError::DuplicateTarget(target.name.clone()).into());
            }
        }

        let request_timeout = Duration::from_secs(settings.request_timeout_secs.max(1));
        let executor = RequestExecutor::new(&ExecutorConfig {
            request_timeout,
            max_idle_per_host: settings.concurrency.max(1),
            ..ExecutorConfig::default()
        })
        .context("Failed to build HTTP client")?;

        Ok(Self {
            benchmarker: EndpointBenchmarker::new(executor),
            prober: HealthProber::new().context("Failed to build health prober")?,
            records: RecordClient::new(request_timeout, settings.seed_max_id)?,
            progress: MultiProgress::with_draw_target(ProgressDrawTarget::hidden()),
            wait_ready: Duration::ZERO,
            targets,
            plan,
            settings,
        })
    }

    /// Render per-endpoint progress bars into `progress`.
    pub fn with_progress(mut self, progress: MultiProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Keep polling targets for up to `wait` before deciding they are down.
    pub fn with_wait_ready(mut self, wait: Duration) -> Self {
        self.wait_ready = wait;
        self
    }

    pub async fn run(self) -> anyhow::Result<RunOutcome> {
        let (live, down) = self.probe_all().await;
        if live.is_empty() {
            return Err(RunError::NoTargets.into());
        }
        if !down.is_empty() {
            warn!(
                "Continuing with {} of {} targets; not reachable: {}",
                live.len(),
                self.targets.len(),
                down.iter().map(|t| t.name.as_str()).collect::<Vec<_>>().join(", ")
            );
        }

        let mut results: BTreeMap<String, Vec<BenchmarkResult>> = live
            .iter()
            .map(|target| (target.name.clone(), Vec::new()))
            .collect();
        let mut comparisons = Vec::new();

        let result = self.run_phases(&live, &mut results, &mut comparisons).await;
        let cleanup = self.cleanup(&live).await;
        result?;

        Ok(RunOutcome {
            targets: live.into_iter().map(|t| t.name).collect(),
            unavailable: down.into_iter().map(|t| t.name).collect(),
            results,
            comparisons,
            cleanup,
        })
    }

    /// Probes every target concurrently; both halves keep caller order.
    async fn probe_all(&self) -> (Vec<Target>, Vec<Target>) {
        let mut set = JoinSet::new();
        for (index, target) in self.targets.iter().cloned().enumerate() {
            let prober = self.prober.clone();
            let wait = self.wait_ready;
            set.spawn(async move {
                let live = if wait.is_zero() {
                    prober.probe(&target).await
                } else {
                    prober.wait_ready(&target, wait).await
                };
                (index, live)
            });
        }

        let mut status = vec![false; self.targets.len()];
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((index, live)) => status[index] = live,
                Err(e) => warn!("Health probe task failed: {}", e),
            }
        }

        let (live, down): (Vec<_>, Vec<_>) = self
            .targets
            .iter()
            .cloned()
            .zip(status)
            .partition(|(_, live)| *live);
        for (target, _) in &live {
            info!("{} is running at {}", target.name, target.base_url);
        }
        (
            live.into_iter().map(|(t, _)| t).collect(),
            down.into_iter().map(|(t, _)| t).collect(),
        )
    }

    async fn run_phases(
        &self,
        live: &[Target],
        results: &mut BTreeMap<String, Vec<BenchmarkResult>>,
        comparisons: &mut Vec<ComparisonRow>,
    ) -> anyhow::Result<()> {
        for (phase, endpoints) in self.plan.phases() {
            info!("Phase {}: {} endpoints", phase, endpoints.len());
            for endpoint in endpoints {
                let mut produced: Vec<(&str, BenchmarkResult)> = Vec::new();
                for target in live {
                    if let Some(result) = self.run_endpoint(target, endpoint).await? {
                        produced.push((target.name.as_str(), result));
                    }
                }

                if let Some(row) =
                    ComparisonRow::from_results(produced.iter().map(|(name, r)| (*name, r)))
                {
                    info!("{} {}: winner {}", row.method, row.endpoint, row.winner_label());
                    comparisons.push(row);
                }
                for (name, result) in produced {
                    results.entry(name.to_string()).or_default().push(result);
                }
            }
        }
        Ok(())
    }

    /// `Ok(None)` when the endpoint needs benchmark-created records and the target has none.
    async fn run_endpoint(
        &self,
        target: &Target,
        endpoint: &EndpointSpec,
    ) -> anyhow::Result<Option<BenchmarkResult>> {
        let (mut requests, concurrency) = endpoint
            .load
            .apply(self.settings.total_requests, self.settings.concurrency);

        let ids = if endpoint.needs_record_ids() {
            let ids = match self.records.benchmark_ids(target).await {
                Ok(ids) => ids,
                Err(e) => {
                    warn!("{}: could not list records: {:#}", target.name, e);
                    Vec::new()
                }
            };
            if ids.is_empty() {
                warn!(
                    "{}: skipping {} {}, no benchmark records to use",
                    target.name, endpoint.method, endpoint.path
                );
                return Ok(None);
            }
            if endpoint.method == Method::Delete {
                requests = requests.min(ids.len() as u64);
            }
            ids
        } else {
            Vec::new()
        };

        let pb = self.progress.add(ProgressBar::new(requests));
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {prefix} [{bar:30.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        pb.set_prefix(format!("[{}]", target.name));
        pb.set_message(format!("{} {}", endpoint.method, endpoint.path));

        let tick = pb.clone();
        let result = self
            .benchmarker
            .clone()
            .on_request(move || tick.inc(1))
            .run_with_ids(target, endpoint, requests, concurrency, &ids)
            .await?;

        pb.set_style(ProgressStyle::with_template("{prefix} {msg}")?);
        pb.finish_with_message(format!(
            "{} {} {} {:.1} req/s, {:.2}ms avg, {}/{} ok",
            style("✔").green(),
            endpoint.method,
            endpoint.path,
            result.requests_per_second,
            result.avg_response_time_ms,
            result.successful_requests,
            result.total_requests
        ));
        Ok(Some(result))
    }

    async fn cleanup(&self, live: &[Target]) -> Vec<CleanupReport> {
        if !self.plan.phases().any(|(phase, _)| phase == Phase::Write) {
            return Vec::new();
        }
        let mut reports = Vec::with_capacity(live.len());
        for target in live {
            reports.push(self.records.cleanup(target).await);
        }
        reports
    }
}
