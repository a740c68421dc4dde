use std::time::Duration;

use reqwest::Client;
use tokio::time::Instant;
use tracing::trace;

use crate::endpoint::Method;
use crate::error::Result;
use crate::ExecutorConfig;

/// Status recorded when the HTTP exchange itself failed.
pub const TRANSPORT_FAILURE: u16 = 0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestSample {
    pub elapsed: Duration,
    pub status: u16,
    pub bytes_received: u64,
}

impl RequestSample {
    fn transport_failure(elapsed: Duration) -> Self {
        Self {
            elapsed,
            status: TRANSPORT_FAILURE,
            bytes_received: 0,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_transport_failure(&self) -> bool {
        self.status == TRANSPORT_FAILURE
    }
}

fn build_client(config: &ExecutorConfig) -> Result<Client> {
    let client = Client::builder()
        .pool_max_idle_per_host(config.max_idle_per_host)
        .timeout(config.request_timeout)
        .connect_timeout(config.connect_timeout)
        .tcp_nodelay(true)
        .no_proxy()
        .build()?;
    Ok(client)
}

#[derive(Debug, Clone)]
pub struct RequestExecutor {
    client: Client,
}

impl RequestExecutor {
    pub fn new(config: &ExecutorConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Issues one request and times it until the body is fully read.
    /// Transport errors come back as a sample with status 0, never as `Err`.
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        payload: Option<&serde_json::Value>,
    ) -> RequestSample {
        let start = Instant::now();
        let mut request = self.client.request(method.into(), url);
        if let Some(body) = payload {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                trace!("{} {} failed: {}", method, url, e);
                return RequestSample::transport_failure(start.elapsed());
            }
        };

        let status = response.status().as_u16();
        match response.bytes().await {
            Ok(body) => RequestSample {
                elapsed: start.elapsed(),
                status,
                bytes_received: body.len() as u64,
            },
            Err(e) => {
                trace!("{} {} body read failed: {}", method, url, e);
                RequestSample::transport_failure(start.elapsed())
            }
        }
    }
}
