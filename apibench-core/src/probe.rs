use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::error::Result;
use crate::target::Target;

pub const HEALTH_PATH: &str = "/health";
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Liveness check against a target's health endpoint.
#[derive(Debug, Clone)]
pub struct HealthProber {
    client: Client,
    timeout: Duration,
    path: String,
}

impl HealthProber {
    pub fn new() -> Result<Self> {
        Self::with_timeout(PROBE_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .no_proxy()
            .build()?;
        Ok(Self {
            client,
            timeout,
            path: HEALTH_PATH.to_string(),
        })
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// True only for an HTTP 200 within the timeout. Never errors.
    pub async fn probe(&self, target: &Target) -> bool {
        let url = target.url(&self.path);
        let request = self.client.get(&url).send();
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) if response.status() == StatusCode::OK => true,
            Ok(Ok(response)) => {
                warn!("{} health check returned {}", target.name, response.status());
                false
            }
            Ok(Err(e)) => {
                warn!("{} is not reachable: {}", target.name, e);
                false
            }
            Err(_) => {
                warn!("{} health check timed out after {:?}", target.name, self.timeout);
                false
            }
        }
    }

    /// Polls until the target is live or `timeout` elapses.
    pub async fn wait_ready(&self, target: &Target, timeout: Duration) -> bool {
        let start = tokio::time::Instant::now();
        loop {
            if self.probe(target).await {
                debug!("{} ready after {:?}", target.name, start.elapsed());
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn server_with_health(status: u16, delay: Duration) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(HEALTH_PATH))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(serde_json::json!({"status": "healthy"}))
                    .set_delay(delay),
            )
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn healthy_target_is_live() {
        let server = server_with_health(200, Duration::ZERO).await;
        let prober = HealthProber::new().unwrap();
        assert!(prober.probe(&Target::new("a", server.uri())).await);
    }

    #[tokio::test]
    async fn non_200_is_not_live() {
        let server = server_with_health(503, Duration::ZERO).await;
        let prober = HealthProber::new().unwrap();
        assert!(!prober.probe(&Target::new("a", server.uri())).await);

        let server = server_with_health(204, Duration::ZERO).await;
        assert!(!prober.probe(&Target::new("a", server.uri())).await);
    }

    #[tokio::test]
    async fn unreachable_target_fails_fast() {
        let prober = HealthProber::new().unwrap();
        let start = Instant::now();
        assert!(!prober.probe(&Target::new("a", "http://127.0.0.1:1")).await);
        assert!(start.elapsed() < PROBE_TIMEOUT);
    }

    #[tokio::test]
    async fn slow_target_times_out() {
        let server = server_with_health(200, Duration::from_secs(3)).await;
        let prober = HealthProber::with_timeout(Duration::from_millis(200)).unwrap();
        let start = Instant::now();
        assert!(!prober.probe(&Target::new("a", server.uri())).await);
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn wait_ready_gives_up_after_timeout() {
        let prober = HealthProber::with_timeout(Duration::from_millis(100)).unwrap();
        let ready = prober
            .wait_ready(&Target::new("a", "http://127.0.0.1:1"), Duration::from_millis(500))
            .await;
        assert!(!ready);
    }
}
