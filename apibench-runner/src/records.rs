use std::time::Duration;

use anyhow::Context;
use apibench_core::Target;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::consts;

#[derive(Debug, Deserialize)]
struct ItemId {
    id: u64,
}

/// Outcome of undoing benchmark writes on one target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub target: String,
    pub deleted: usize,
    pub failed: Vec<u64>,
    pub listing_failed: bool,
}

/// Talks to a target's item collection outside of measured batches.
#[derive(Debug, Clone)]
pub struct RecordClient {
    client: Client,
    seed_max_id: u64,
}

impl RecordClient {
    pub fn new(timeout: Duration, seed_max_id: u64) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .context("Failed to build record client")?;
        Ok(Self {
            client,
            seed_max_id,
        })
    }

    pub async fn list_ids(&self, target: &Target) -> anyhow::Result<Vec<u64>> {
        let items: Vec<ItemId> = self
            .client
            .get(target.url(consts::ITEMS_PATH))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
            .with_context(|| format!("Unexpected item list from {}", target.name))?;
        Ok(items.into_iter().map(|item| item.id).collect())
    }

    /// Ids above the seed range, ascending.
    pub async fn benchmark_ids(&self, target: &Target) -> anyhow::Result<Vec<u64>> {
        let mut ids: Vec<u64> = self
            .list_ids(target)
            .await?
            .into_iter()
            .filter(|id| *id > self.seed_max_id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    pub async fn delete(&self, target: &Target, id: u64) -> anyhow::Result<()> {
        self.client
            .delete(target.url(&format!("{}/{}", consts::ITEMS_PATH, id)))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Deletes every benchmark-created record one by one. Never fails; problems are
    /// logged and reported.
    pub async fn cleanup(&self, target: &Target) -> CleanupReport {
        let mut report = CleanupReport {
            target: target.name.clone(),
            ..CleanupReport::default()
        };

        let ids = match self.benchmark_ids(target).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("{}: could not list records for cleanup: {:#}", target.name, e);
                report.listing_failed = true;
                return report;
            }
        };

        for id in ids {
            match self.delete(target, id).await {
                Ok(()) => report.deleted += 1,
                Err(e) => {
                    warn!("{}: failed to delete record {}: {:#}", target.name, id, e);
                    report.failed.push(id);
                }
            }
        }

        if report.failed.is_empty() {
            info!("{}: cleaned up {} records", target.name, report.deleted);
        } else {
            debug!("{}: {} records left behind", target.name, report.failed.len());
        }
        report
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

    /// In-memory item collection behind a mock server, seeded with ids 1-3.
    #[derive(Clone)]
    pub(crate) struct ItemStore {
        items: Arc<Mutex<Vec<u64>>>,
        next_id: Arc<Mutex<u64>>,
        stuck: Option<u64>,
    }

    impl ItemStore {
        pub(crate) fn seeded() -> Self {
            Self {
                items: Arc::new(Mutex::new(vec![1, 2, 3])),
                next_id: Arc::new(Mutex::new(4)),
                stuck: None,
            }
        }

        pub(crate) fn with_stuck(mut self, id: u64) -> Self {
            self.stuck = Some(id);
            self
        }

        pub(crate) fn ids(&self) -> Vec<u64> {
            self.items.lock().unwrap().clone()
        }

        pub(crate) fn insert(&self) -> u64 {
            let mut next = self.next_id.lock().unwrap();
            let id = *next;
            *next += 1;
            self.items.lock().unwrap().push(id);
            id
        }

        pub(crate) async fn mount(&self, server: &MockServer) {
            Mock::given(method("GET"))
                .and(path(consts::ITEMS_PATH))
                .respond_with(self.clone())
                .mount(server)
                .await;
            Mock::given(method("POST"))
                .and(path(consts::ITEMS_PATH))
                .respond_with(self.clone())
                .mount(server)
                .await;
            Mock::given(path_regex(r"^/db/items/\d+$"))
                .respond_with(self.clone())
                .mount(server)
                .await;
        }

        fn item_json(id: u64) -> serde_json::Value {
            serde_json::json!({
                "id": id,
                "name": "Item",
                "description": null,
                "price": 1.0,
                "created_at": "2024-01-01 00:00:00"
            })
        }
    }

    impl Respond for ItemStore {
        fn respond(&self, request: &Request) -> ResponseTemplate {
            let url_path = request.url.path();
            let method = request.method.as_str();
            if url_path == consts::ITEMS_PATH {
                return match method {
                    "GET" => {
                        let items: Vec<_> = self.ids().into_iter().map(Self::item_json).collect();
                        ResponseTemplate::new(200).set_body_json(items)
                    }
                    "POST" => ResponseTemplate::new(200).set_body_json(Self::item_json(self.insert())),
                    _ => ResponseTemplate::new(405),
                };
            }

            let Some(id) = url_path
                .rsplit('/')
                .next()
                .and_then(|segment| segment.parse::<u64>().ok())
            else {
                return ResponseTemplate::new(404);
            };
            let exists = self.ids().contains(&id);
            match method {
                "GET" | "PUT" if exists => ResponseTemplate::new(200).set_body_json(Self::item_json(id)),
                "DELETE" if exists && self.stuck == Some(id) => ResponseTemplate::new(500),
                "DELETE" if exists => {
                    self.items.lock().unwrap().retain(|item| *item != id);
                    ResponseTemplate::new(200).set_body_json(serde_json::json!({"message": "Item deleted"}))
                }
                _ => ResponseTemplate::new(404),
            }
        }
    }

    #[tokio::test]
    async fn cleanup_removes_only_benchmark_records() {
        let server = MockServer::start().await;
        let store = ItemStore::seeded();
        store.mount(&server).await;
        for _ in 0..5 {
            store.insert();
        }

        let client = RecordClient::new(Duration::from_secs(5), 3).unwrap();
        let target = Target::new("a", server.uri());
        assert_eq!(client.benchmark_ids(&target).await.unwrap(), vec![4, 5, 6, 7, 8]);

        let report = client.cleanup(&target).await;
        assert_eq!(report.deleted, 5);
        assert!(report.failed.is_empty());
        assert_eq!(client.list_ids(&target).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn stuck_record_does_not_block_the_rest() {
        let server = MockServer::start().await;
        let store = ItemStore::seeded().with_stuck(5);
        store.mount(&server).await;
        for _ in 0..3 {
            store.insert();
        }

        let client = RecordClient::new(Duration::from_secs(5), 3).unwrap();
        let report = client.cleanup(&Target::new("a", server.uri())).await;

        assert_eq!(report.deleted, 2);
        assert_eq!(report.failed, vec![5]);
        assert_eq!(store.ids(), vec![1, 2, 3, 5]);
    }

    #[tokio::test]
    async fn unreachable_target_reports_listing_failure() {
        let client = RecordClient::new(Duration::from_secs(1), 3).unwrap();
        let report = client.cleanup(&Target::new("a", "http://127.0.0.1:1")).await;
        assert!(report.listing_failed);
        assert_eq!(report.deleted, 0);
    }
}
