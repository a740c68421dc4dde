use serde::{Deserialize, Serialize};

/// Run-wide knobs recorded alongside the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSettings {
    pub total_requests: u64,
    pub concurrency: usize,
    /// Records with ids above this were created by the benchmark
    pub seed_max_id: u64,
    #[serde(default)]
    pub request_timeout_secs: u64,
}

/// Partial settings as written in a workload file. Unset fields fall back to the CLI
/// or built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsOverrides {
    #[serde(default)]
    pub requests: Option<u64>,
    #[serde(default)]
    pub concurrency: Option<usize>,
    #[serde(default)]
    pub seed_max_id: Option<u64>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl SettingsOverrides {
    /// Later documents win field by field.
    pub fn merge(&mut self, other: SettingsOverrides) {
        if other.requests.is_some() {
            self.requests = other.requests;
        }
        if other.concurrency.is_some() {
            self.concurrency = other.concurrency;
        }
        if other.seed_max_id.is_some() {
            self.seed_max_id = other.seed_max_id;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
    }
}
