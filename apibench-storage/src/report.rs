use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use apibench_core::{BenchmarkResult, ComparisonRow, Scoreboard, score};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{Result, RunSettings};

/// Everything a run produced, as written to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub timestamp: DateTime<Utc>,
    pub run_id: Uuid,
    pub settings: RunSettings,
    /// Live targets in tie-break order
    pub targets: Vec<String>,
    /// Targets that failed the health probe
    #[serde(default)]
    pub unavailable: Vec<String>,
    pub results: BTreeMap<String, Vec<BenchmarkResult>>,
    pub comparisons: Vec<ComparisonRow>,
    pub scores: Scoreboard,
}

impl Report {
    pub fn new(
        settings: RunSettings,
        targets: Vec<String>,
        unavailable: Vec<String>,
        results: BTreeMap<String, Vec<BenchmarkResult>>,
        comparisons: Vec<ComparisonRow>,
    ) -> Self {
        let scores = score(&targets, &comparisons);
        Self {
            timestamp: Utc::now(),
            run_id: Uuid::new_v4(),
            settings,
            targets,
            unavailable,
            results,
            comparisons,
            scores,
        }
    }

    pub fn results_for(&self, target: &str) -> &[BenchmarkResult] {
        self.results.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)?;
        info!("Report saved to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = fs::File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Per-endpoint series for an external chart renderer.
    pub fn chart_data(&self) -> ChartData {
        let labels = self
            .comparisons
            .iter()
            .map(|row| format!("{} {}", row.method, row.endpoint))
            .collect();
        let series = self
            .targets
            .iter()
            .map(|target| {
                let (requests_per_second, avg_response_time_ms): (Vec<f64>, Vec<f64>) = self
                    .comparisons
                    .iter()
                    .map(|row| {
                        row.measure(target)
                            .map(|m| (m.requests_per_second, m.avg_response_time_ms))
                            .unwrap_or((0.0, 0.0))
                    })
                    .unzip();
                ChartSeries {
                    target: target.clone(),
                    requests_per_second,
                    avg_response_time_ms,
                }
            })
            .collect();
        ChartData { labels, series }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub target: String,
    pub requests_per_second: Vec<f64>,
    pub avg_response_time_ms: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartData {
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json(path, self)?;
        info!("Chart data saved to {}", path.display());
        Ok(())
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(fs::File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
