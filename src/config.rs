//! Configuration for the Vision API adapter

use crate::error::{Result, VisionError};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Vision API client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// API host without scheme, e.g. `vision.example.com` or `127.0.0.1:9091`
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// URL scheme; the hosted API is always https
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Transport timeout in milliseconds; unset means no client-side timeout
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Refresh token (read from env VISION_REFRESH_TOKEN if not set)
    #[serde(default, skip_serializing)]
    pub refresh_token: Option<SecretString>,
}

fn default_api_host() -> String {
    "localhost:9091".to_string()
}

fn default_scheme() -> String {
    "https".to_string()
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_host: default_api_host(),
            scheme: default_scheme(),
            timeout_ms: None,
            refresh_token: None,
        }
    }
}

impl VisionConfig {
    /// Configuration pointing at `api_host` with every other field defaulted
    pub fn for_host(api_host: impl Into<String>) -> Self {
        Self {
            api_host: api_host.into(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables
    pub fn from_env(mut self) -> Self {
        dotenvy::dotenv().ok();

        if let Ok(val) = std::env::var("VISION_API_HOST") {
            self.api_host = val;
        }

        if let Ok(val) = std::env::var("VISION_API_SCHEME") {
            self.scheme = val.to_lowercase();
        }

        if let Ok(val) = std::env::var("VISION_TIMEOUT_MS") {
            if let Ok(timeout) = val.parse() {
                self.timeout_ms = Some(timeout);
            }
        }

        if let Ok(val) = std::env::var("VISION_REFRESH_TOKEN") {
            if !val.is_empty() {
                self.refresh_token = Some(SecretString::new(val));
            }
        }

        self
    }

    /// Load configuration from a file (toml, yaml or json), with
    /// `VISION_`-prefixed environment variables layered on top
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("VISION").try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that can never produce a valid request URL
    pub fn validate(&self) -> Result<()> {
        if self.api_host.trim().is_empty() {
            return Err(VisionError::Configuration("api_host must not be empty".to_string()));
        }
        if self.api_host.contains("://") {
            return Err(VisionError::Configuration(format!(
                "api_host must not include a scheme: {}",
                self.api_host
            )));
        }
        match self.scheme.as_str() {
            "http" | "https" => Ok(()),
            other => Err(VisionError::Configuration(format!(
                "unsupported scheme: {}",
                other
            ))),
        }
    }

    /// Base URL all endpoints hang off
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.api_host.trim_end_matches('/'))
    }

    /// Get timeout as Duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
