use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A backend under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub name: String,
    pub base_url: String,
}

impl Target {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            name: name.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Like [`Target::new`], rejecting empty names and urls without an http(s) scheme.
    pub fn checked(name: &str, url: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::InvalidTarget(url.to_string(), "empty name".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::InvalidTarget(
                format!("{}={}", name, url),
                "url must start with http:// or https://".to_string(),
            ));
        }
        Ok(Target::new(name, url))
    }

    pub fn url(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.base_url)
    }
}

/// Accepts `name=url` or a bare url, in which case the url doubles as the name.
impl FromStr for Target {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        let (name, url) = match value.split_once('=') {
            Some((name, url)) => (name.trim(), url.trim()),
            None => (value.trim(), value.trim()),
        };
        Target::checked(name, url)
    }
}
