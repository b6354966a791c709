//! Loading request headers from a credentials file.
//!
//! The file is JSON with a single `headers` object:
//!
//! ```json
//! { "headers": { "User-Agent": "imgfetch/0.1", "Authorization": "Bearer abc" } }
//! ```
//!
//! Any problem reading it is fatal for the batch: there is no fallback to
//! partial or empty credentials.

use crate::error::{Error, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Default location of the credentials file.
pub const DEFAULT_CREDENTIALS_PATH: &str = "credentials.json";

/// Headers attached to every outgoing request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    pub headers: BTreeMap<String, String>,
}

impl Credentials {
    /// Reads and parses the credentials file at `path`.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .await
            .map_err(|e| credentials_error(path, e))?;
        Self::parse(path, &raw)
    }

    fn parse(path: &Path, raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| credentials_error(path, e))
    }

    /// Converts the headers into a [`HeaderMap`], validating names and values.
    pub fn header_map(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| Error::Credentials {
                path: PathBuf::new(),
                reason: format!("invalid header name {:?}: {}", name, e),
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| Error::Credentials {
                path: PathBuf::new(),
                reason: format!("invalid value for header {}: {}", name, e),
            })?;
            map.insert(name, value);
        }
        Ok(map)
    }

    /// Loads `path` and returns its headers as a [`HeaderMap`].
    pub async fn load_header_map(path: impl AsRef<Path>) -> Result<HeaderMap> {
        let path = path.as_ref();
        Self::load(path).await?.header_map().map_err(|e| match e {
            Error::Credentials { reason, .. } => Error::Credentials {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }
}

fn credentials_error(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::Credentials {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}
