//! Configuration for indexes and the HTTP client.
//!
//! Both can be loaded from a TOML file:
//!
//! ```toml
//! [client]
//! region = "us-east-1"
//! timeout_secs = 30
//! sign_requests = true
//!
//! [client.headers]
//! x-api-key = "..."
//!
//! [index]
//! name = "movies"
//! bucket = "my-bucket"
//! dimensions = 20
//! distance = "cosine"
//! id_type = "string"
//! non_filterable = ["description"]
//! ```

use crate::distance::DistanceMetric;
use crate::error::{NeighborError, Result};
use crate::id::IdType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub index: Option<IndexConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| NeighborError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| NeighborError::Config(e.to_string()))
    }
}

/// Identifying configuration of an index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    pub name: String,
    pub bucket: String,
    pub dimensions: usize,
    pub distance: DistanceMetric,
    #[serde(default)]
    pub id_type: IdType,
    /// Metadata keys excluded from filtering at creation time
    #[serde(default)]
    pub non_filterable: Vec<String>,
}

impl IndexConfig {
    pub fn new(
        name: impl Into<String>,
        bucket: impl Into<String>,
        dimensions: usize,
        distance: DistanceMetric,
    ) -> Self {
        Self {
            name: name.into(),
            bucket: bucket.into(),
            dimensions,
            distance,
            id_type: IdType::String,
            non_filterable: Vec::new(),
        }
    }

    pub fn with_id_type(mut self, id_type: IdType) -> Self {
        self.id_type = id_type;
        self
    }

    pub fn with_non_filterable<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.non_filterable = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            return Err(NeighborError::InvalidDimensions(self.dimensions));
        }
        if self.name.is_empty() {
            return Err(NeighborError::Config("index name must not be empty".to_string()));
        }
        if self.bucket.is_empty() {
            return Err(NeighborError::Config("bucket must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Connection settings for [`HttpClient`](crate::HttpClient)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Full endpoint URL; takes precedence over `region`
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Static headers added to every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Sign requests with SigV4 using the AWS credential chain
    #[serde(default)]
    pub sign_requests: bool,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            headers: BTreeMap::new(),
            sign_requests: false,
        }
    }
}

impl ClientConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_signing(mut self, sign_requests: bool) -> Self {
        self.sign_requests = sign_requests;
        self
    }

    /// Read settings from the process environment.
    ///
    /// `S3VECTORS_ENDPOINT`, `AWS_REGION` (falling back to
    /// `AWS_DEFAULT_REGION`), `S3VECTORS_TIMEOUT_SECS` and
    /// `S3VECTORS_SIGN_REQUESTS`.
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env(|key| std::env::var(key).ok())
    }

    /// Overlay environment settings using `lookup` to read variables.
    pub fn merge_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(endpoint) = non_empty("S3VECTORS_ENDPOINT") {
            self.endpoint = Some(endpoint);
        }
        if let Some(region) = non_empty("AWS_REGION").or_else(|| non_empty("AWS_DEFAULT_REGION")) {
            self.region = Some(region);
        }
        if let Some(timeout) = non_empty("S3VECTORS_TIMEOUT_SECS") {
            self.timeout_secs = timeout.trim().parse().map_err(|_| {
                NeighborError::Config(format!("invalid S3VECTORS_TIMEOUT_SECS: {}", timeout))
            })?;
        }
        if let Some(sign) = non_empty("S3VECTORS_SIGN_REQUESTS") {
            self.sign_requests = match sign.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(NeighborError::Config(format!(
                        "invalid S3VECTORS_SIGN_REQUESTS: {}",
                        sign
                    )))
                }
            };
        }
        Ok(self)
    }

    /// Endpoint URL without a trailing slash.
    pub fn resolve_endpoint(&self) -> Result<String> {
        if let Some(endpoint) = &self.endpoint {
            return Ok(endpoint.trim_end_matches('/').to_string());
        }
        match &self.region {
            Some(region) => Ok(format!("https://s3vectors.{}.api.aws", region)),
            None => Err(NeighborError::Config(
                "no endpoint or region configured".to_string(),
            )),
        }
    }
}
