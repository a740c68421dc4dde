use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::debug;

use crate::endpoint::EndpointSpec;
use crate::error::Result;
use crate::executor::RequestExecutor;
use crate::limiter::ConcurrencyLimiter;
use crate::result::BenchmarkResult;
use crate::target::Target;

type RequestHook = Arc<dyn Fn() + Send + Sync>;

/// Drives one endpoint against one target with a fixed request count.
#[derive(Clone)]
pub struct EndpointBenchmarker {
    executor: RequestExecutor,
    on_request: Option<RequestHook>,
}

impl fmt::Debug for EndpointBenchmarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointBenchmarker")
            .field("executor", &self.executor)
            .field("on_request", &self.on_request.is_some())
            .finish()
    }
}

impl EndpointBenchmarker {
    pub fn new(executor: RequestExecutor) -> Self {
        Self {
            executor,
            on_request: None,
        }
    }

    /// Called once per completed request, e.g. to advance a progress bar.
    pub fn on_request<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_request = Some(Arc::new(hook));
        self
    }

    pub async fn run(
        &self,
        target: &Target,
        endpoint: &EndpointSpec,
        total_requests: u64,
        concurrency: usize,
    ) -> Result<BenchmarkResult> {
        self.run_with_ids(target, endpoint, total_requests, concurrency, &[])
            .await
    }

    /// Like [`run`](Self::run), substituting `{id}` in the path with `ids` in rotation.
    pub async fn run_with_ids(
        &self,
        target: &Target,
        endpoint: &EndpointSpec,
        total_requests: u64,
        concurrency: usize,
        ids: &[u64],
    ) -> Result<BenchmarkResult> {
        let limiter = ConcurrencyLimiter::new(concurrency);
        let payload = endpoint.payload.clone().map(Arc::new);
        debug!(
            "{} {} {} on {}: {} requests, concurrency {}",
            endpoint.phase,
            endpoint.method,
            endpoint.path,
            target.name,
            total_requests,
            limiter.limit()
        );

        let start = Instant::now();
        let samples = limiter
            .run(total_requests, |index| {
                let executor = self.executor.clone();
                let url = target.url(&endpoint.resolve_path(index, ids));
                let payload = payload.clone();
                let hook = self.on_request.clone();
                let method = endpoint.method;
                async move {
                    let sample = executor.execute(method, &url, payload.as_deref()).await;
                    if let Some(hook) = hook {
                        hook();
                    }
                    sample
                }
            })
            .await?;
        let span = start.elapsed();

        let result = BenchmarkResult::from_samples(endpoint, total_requests, &samples, span);
        debug!(
            "{} {} on {}: {:.2} req/s, avg {:.2}ms, {} failed",
            endpoint.method,
            endpoint.path,
            target.name,
            result.requests_per_second,
            result.avg_response_time_ms,
            result.failed_requests
        );
        Ok(result)
    }
}
