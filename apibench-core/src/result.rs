use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::endpoint::{EndpointSpec, Method, Phase};
use crate::executor::RequestSample;
use crate::stats::LatencySummary;

/// Aggregate of one (target, endpoint) batch. Latencies are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkResult {
    pub endpoint: String,
    pub method: Method,
    pub phase: Phase,
    #[serde(default)]
    pub description: String,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub avg_response_time_ms: f64,
    pub min_response_time_ms: f64,
    pub max_response_time_ms: f64,
    pub median_response_time_ms: f64,
    pub p95_response_time_ms: f64,
    pub requests_per_second: f64,
    pub total_time_secs: f64,
    /// Fraction of requests with a 2xx status, 0..1
    pub success_rate: f64,
    #[serde(default)]
    pub bytes_received: u64,
    /// Responses per status code; key 0 counts transport failures
    #[serde(default)]
    pub status_counts: BTreeMap<u16, u64>,
}

impl BenchmarkResult {
    pub fn from_samples(
        endpoint: &EndpointSpec,
        total_requests: u64,
        samples: &[RequestSample],
        span: Duration,
    ) -> Self {
        let successful_requests = samples.iter().filter(|s| s.is_success()).count() as u64;
        let failed_requests = total_requests.saturating_sub(successful_requests);

        let durations: Vec<Duration> = samples.iter().map(|s| s.elapsed).collect();
        let latency = LatencySummary::from_durations(&durations).to_millis();

        let total_time_secs = span.as_secs_f64();
        let requests_per_second = if total_time_secs > 0.0 {
            total_requests as f64 / total_time_secs
        } else {
            0.0
        };
        let success_rate = if total_requests > 0 {
            successful_requests as f64 / total_requests as f64
        } else {
            0.0
        };

        let mut status_counts = BTreeMap::new();
        for sample in samples {
            *status_counts.entry(sample.status).or_insert(0) += 1;
        }

        Self {
            endpoint: endpoint.path.clone(),
            method: endpoint.method,
            phase: endpoint.phase,
            description: endpoint.description.clone(),
            total_requests,
            successful_requests,
            failed_requests,
            avg_response_time_ms: latency.mean,
            min_response_time_ms: latency.min,
            max_response_time_ms: latency.max,
            median_response_time_ms: latency.median,
            p95_response_time_ms: latency.p95,
            requests_per_second,
            total_time_secs,
            success_rate,
            bytes_received: samples.iter().map(|s| s.bytes_received).sum(),
            status_counts,
        }
    }

    pub fn transport_failures(&self) -> u64 {
        self.status_counts
            .get(&crate::executor::TRANSPORT_FAILURE)
            .copied()
            .unwrap_or(0)
    }

    /// Failed responses that did reach the server, grouped by status.
    pub fn http_failures(&self) -> impl Iterator<Item = (u16, u64)> + '_ {
        self.status_counts
            .iter()
            .filter(|(status, _)| **status != 0 && !(200..300).contains(*status))
            .map(|(status, count)| (*status, *count))
    }
}
