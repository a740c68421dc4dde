use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Placeholder replaced by a benchmark-created record id at request time.
pub const ID_PLACEHOLDER: &str = "{id}";

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            _ => Err(Error::UnsupportedMethod(value.to_string())),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Workload category. Declaration order is execution order.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Basic,
    Read,
    Write,
    Stress,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Basic, Phase::Read, Phase::Write, Phase::Stress];
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Basic => "basic",
            Phase::Read => "read",
            Phase::Write => "write",
            Phase::Stress => "stress",
        };
        f.pad(name)
    }
}

impl TryFrom<&str> for Phase {
    type Error = String;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        match value {
            "basic" => Ok(Phase::Basic),
            "read" => Ok(Phase::Read),
            "write" => Ok(Phase::Write),
            "stress" => Ok(Phase::Stress),
            _ => Err(format!("Unknown phase: {}", value)),
        }
    }
}

/// How the run-wide request count and concurrency are scaled for one endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LoadProfile {
    #[default]
    Full,
    Scaled {
        #[serde(default = "default_divisor")]
        divisor: u64,
        #[serde(default)]
        cap: Option<u64>,
        #[serde(default = "default_concurrency_divisor")]
        concurrency_divisor: usize,
        #[serde(default)]
        concurrency_cap: Option<usize>,
    },
}

fn default_divisor() -> u64 {
    1
}

fn default_concurrency_divisor() -> usize {
    1
}

impl LoadProfile {
    pub fn scaled(divisor: u64, cap: Option<u64>) -> Self {
        LoadProfile::Scaled {
            divisor,
            cap,
            concurrency_divisor: 1,
            concurrency_cap: None,
        }
    }

    pub fn with_concurrency(self, divisor: usize, cap: Option<usize>) -> Self {
        match self {
            LoadProfile::Full => LoadProfile::Scaled {
                divisor: 1,
                cap: None,
                concurrency_divisor: divisor,
                concurrency_cap: cap,
            },
            LoadProfile::Scaled { divisor: d, cap: c, .. } => LoadProfile::Scaled {
                divisor: d,
                cap: c,
                concurrency_divisor: divisor,
                concurrency_cap: cap,
            },
        }
    }

    /// Returns `(requests, concurrency)`; concurrency never drops below one.
    pub fn apply(&self, total_requests: u64, concurrency: usize) -> (u64, usize) {
        match *self {
            LoadProfile::Full => (total_requests, concurrency.max(1)),
            LoadProfile::Scaled {
                divisor,
                cap,
                concurrency_divisor,
                concurrency_cap,
            } => {
                let mut requests = total_requests / divisor.max(1);
                if let Some(cap) = cap {
                    requests = requests.min(cap);
                }
                let mut workers = concurrency / concurrency_divisor.max(1);
                if let Some(cap) = concurrency_cap {
                    workers = workers.min(cap);
                }
                (requests, workers.max(1))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub path: String,
    pub method: Method,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
    #[serde(default)]
    pub description: String,
    pub phase: Phase,
    #[serde(default)]
    pub load: LoadProfile,
}

impl EndpointSpec {
    pub fn new(method: Method, path: impl Into<String>, phase: Phase) -> Self {
        Self {
            path: path.into(),
            method,
            payload: None,
            description: String::new(),
            phase,
            load: LoadProfile::Full,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_load(mut self, load: LoadProfile) -> Self {
        self.load = load;
        self
    }

    pub fn needs_record_ids(&self) -> bool {
        self.path.contains(ID_PLACEHOLDER)
    }

    /// Path for the request at `index`, rotating through `ids` when the path is a template.
    pub fn resolve_path(&self, index: u64, ids: &[u64]) -> String {
        if !self.needs_record_ids() || ids.is_empty() {
            return self.path.clone();
        }
        let id = ids[(index % ids.len() as u64) as usize];
        self.path.replace(ID_PLACEHOLDER, &id.to_string())
    }
}
