//! Kodopo Client Configuration
//!
//! TOML-based configuration with environment variable overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Root application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
}

/// Backend API settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every relative request path is resolved against
    pub base_url: String,
    /// Public origin prefixed onto server-relative asset URLs
    pub asset_origin: String,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://kodopo.tech/api".to_string(),
            asset_origin: "https://kodopo.tech".to_string(),
            timeout_ms: 10_000,
            user_agent: format!("kodopo-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Session lifecycle settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Path of the token refresh endpoint, relative to `api.base_url`
    pub refresh_path: String,
    /// Route the shell is sent to when the session ends
    pub login_route: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            refresh_path: "/Auth/Refresh".to_string(),
            login_route: "/login".to_string(),
        }
    }
}

/// Local persistence settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub credentials_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            credentials_path: "./data/credentials.json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable override
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError("api.base_url must not be empty".into()));
        }
        if self.api.asset_origin.trim().is_empty() {
            return Err(ConfigError::ValidationError("api.asset_origin must not be empty".into()));
        }
        if self.api.timeout_ms == 0 {
            return Err(ConfigError::ValidationError("api.timeout_ms must be positive".into()));
        }
        if !self.session.refresh_path.starts_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "session.refresh_path must start with '/': {}",
                self.session.refresh_path
            )));
        }
        Ok(())
    }

    /// Generate an example TOML configuration
    pub fn example_toml() -> String {
        r#"# Kodopo client configuration
# Environment variables (KODOPO_*) override these settings

[api]
base_url = "https://kodopo.tech/api"
asset_origin = "https://kodopo.tech"
timeout_ms = 10000

[session]
refresh_path = "/Auth/Refresh"
login_route = "/login"

[storage]
credentials_path = "./data/credentials.json"
"#
        .to_string()
    }
}
