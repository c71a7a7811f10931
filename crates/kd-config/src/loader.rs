//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "kodopo.toml",
    "config.toml",
    "./config/kodopo.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found) with environment variable overrides
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        self.load_with(|key| env::var(key).ok())
    }

    /// Load using a custom variable lookup in place of the process environment
    pub fn load_with<F>(&self, lookup: F) -> Result<AppConfig, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AppConfig::default();

        if let Some(path) = self.find_config_file(&lookup) {
            info!(?path, "Loading configuration from file");
            config = AppConfig::from_file(&path)?;
        }

        apply_overrides(&mut config, &lookup);
        config.validate()?;

        Ok(config)
    }

    /// Find the configuration file to use
    fn find_config_file<F>(&self, lookup: &F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured file does not exist, falling back to search paths");
        }

        if let Some(path) = lookup("KODOPO_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

/// Apply environment variable overrides
fn apply_overrides<F>(config: &mut AppConfig, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    // API
    if let Some(val) = lookup("KODOPO_API_BASE_URL") {
        config.api.base_url = val;
    }
    if let Some(val) = lookup("KODOPO_ASSET_ORIGIN") {
        config.api.asset_origin = val;
    }
    if let Some(val) = lookup("KODOPO_TIMEOUT_MS") {
        match val.parse() {
            Ok(timeout) => config.api.timeout_ms = timeout,
            Err(_) => warn!(value = %val, "Ignoring unparseable KODOPO_TIMEOUT_MS"),
        }
    }

    // Session
    if let Some(val) = lookup("KODOPO_REFRESH_PATH") {
        config.session.refresh_path = val;
    }
    if let Some(val) = lookup("KODOPO_LOGIN_ROUTE") {
        config.session.login_route = val;
    }

    // Storage
    if let Some(val) = lookup("KODOPO_CREDENTIALS_PATH") {
        config.storage.credentials_path = val;
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_explicit_file_is_loaded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"http://localhost:5000/api\"\ntimeout_ms = 3000").unwrap();

        let config = ConfigLoader::with_path(file.path())
            .load_with(|_| None)
            .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.api.timeout_ms, 3000);
        assert_eq!(config.session.refresh_path, "/Auth/Refresh");
    }

    #[test]
    fn test_env_overrides_win_over_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nbase_url = \"http://file/api\"").unwrap();
        let env = vars(&[
            ("KODOPO_API_BASE_URL", "http://env/api"),
            ("KODOPO_CREDENTIALS_PATH", "/tmp/creds.json"),
            ("KODOPO_LOGIN_ROUTE", "/signin"),
        ]);

        let config = ConfigLoader::with_path(file.path())
            .load_with(|key| env.get(key).cloned())
            .unwrap();

        assert_eq!(config.api.base_url, "http://env/api");
        assert_eq!(config.storage.credentials_path, "/tmp/creds.json");
        assert_eq!(config.session.login_route, "/signin");
    }

    #[test]
    fn test_unparseable_timeout_is_ignored() {
        let env = vars(&[("KODOPO_TIMEOUT_MS", "soon")]);
        let config = ConfigLoader::with_path("/nonexistent/kodopo.toml")
            .load_with(|key| env.get(key).cloned())
            .unwrap();
        assert_eq!(config.api.timeout_ms, 10_000);
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let env = vars(&[("KODOPO_REFRESH_PATH", "refresh")]);
        let result = ConfigLoader::with_path("/nonexistent/kodopo.toml")
            .load_with(|key| env.get(key).cloned());
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api\nbase_url = ").unwrap();
        let result = ConfigLoader::with_path(file.path()).load_with(|_| None);
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
