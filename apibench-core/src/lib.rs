use std::time::Duration;

mod comparison;
mod endpoint;
mod error;
mod executor;
mod limiter;
mod probe;
mod result;
mod runner;
mod stats;
mod target;

pub use comparison::*;
pub use endpoint::*;
pub use error::*;
pub use executor::{RequestExecutor, RequestSample, TRANSPORT_FAILURE};
pub use limiter::ConcurrencyLimiter;
pub use probe::{HEALTH_PATH, HealthProber, PROBE_TIMEOUT};
pub use result::BenchmarkResult;
pub use runner::EndpointBenchmarker;
pub use stats::{LatencySummary, median, quantiles};
pub use target::Target;

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Upper bound for one request, body included
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Idle connections kept per target between requests
    pub max_idle_per_host: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_idle_per_host: 64,
        }
    }
}
