use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
    #[error("JSON error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Invalid workload: {0}")]
    InvalidConfig(#[from] apibench_core::Error),
    #[error("Workload path not found: {}", .0.display())]
    NotFound(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
