use std::path::Path;
use std::sync::Arc;

use apibench_core::{EndpointSpec, Target};
use serde::Deserialize;
use tracing::debug;
use walkdir::WalkDir;

use crate::{Error, Result, SettingsOverrides};

/// Workload definition loaded from YAML/JSON documents tagged with `type`.
#[derive(Debug, Clone)]
pub struct Config {
    inner: Arc<ConfigInner>,
}

#[derive(Debug, Default)]
struct ConfigInner {
    targets: Vec<Target>,
    endpoints: Vec<EndpointSpec>,
    settings: SettingsOverrides,
}

#[derive(Debug, Deserialize)]
struct TargetEntry {
    name: String,
    url: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ConfigFile {
    Target(TargetEntry),
    Endpoint(Box<EndpointSpec>),
    Settings(SettingsOverrides),
}

fn is_config_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext == "yaml" || ext == "yml" || ext == "json" || ext == "jsonl")
        .unwrap_or(false)
}

fn parse_items(path: &Path) -> Result<Vec<ConfigFile>> {
    let content = std::fs::read_to_string(path)?;
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    let items = match ext {
        "json" => {
            let value: serde_json::Value = serde_json::from_str(&content)?;
            if value.is_array() {
                serde_json::from_value(value)?
            } else {
                vec![serde_json::from_value(value)?]
            }
        }
        "jsonl" => content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(Error::Serialize))
            .collect::<Result<Vec<_>>>()?,
        "yaml" | "yml" => {
            let mut items = Vec::new();
            for doc in serde_yaml::Deserializer::from_str(&content) {
                let value = serde_yaml::Value::deserialize(doc)?;
                if value.is_null() {
                    continue;
                }
                if value.is_sequence() {
                    items.extend(serde_yaml::from_value::<Vec<ConfigFile>>(value)?);
                } else {
                    items.push(serde_yaml::from_value(value)?);
                }
            }
            items
        }
        _ => Vec::new(),
    };
    Ok(items)
}

impl Config {
    /// Loads a single file, or every config file under a directory in file-name order.
    /// Document order is preserved; it decides target order and endpoint order.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let files: Vec<_> = if path.is_file() {
            vec![path.to_path_buf()]
        } else {
            WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .filter(|e| is_config_file(e.path()))
                .map(|e| e.into_path())
                .collect()
        };

        files
            .iter()
            .try_fold(ConfigInner::default(), |mut acc, file| -> Result<_> {
                let items = parse_items(file)?;
                debug!("{}: {} documents", file.display(), items.len());
                for item in items {
                    match item {
                        ConfigFile::Target(entry) => {
                            acc.targets.push(Target::checked(&entry.name, &entry.url)?)
                        }
                        ConfigFile::Endpoint(endpoint) => acc.endpoints.push(*endpoint),
                        ConfigFile::Settings(settings) => acc.settings.merge(settings),
                    }
                }
                Ok(acc)
            })
            .map(|inner| Config {
                inner: Arc::new(inner),
            })
    }

    pub fn targets(&self) -> &[Target] {
        &self.inner.targets
    }

    pub fn endpoints(&self) -> &[EndpointSpec] {
        &self.inner.endpoints
    }

    pub fn settings(&self) -> &SettingsOverrides {
        &self.inner.settings
    }
}
