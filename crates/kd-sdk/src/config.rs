//! SDK Configuration

use std::time::Duration;

/// Configuration for the Kodopo client
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL for the backend API; relative request paths resolve against it
    pub base_url: String,

    /// Public origin prefixed onto server-relative asset URLs
    pub asset_origin: String,

    /// Path of the token refresh endpoint
    pub refresh_path: String,

    /// Route announced with session termination events
    pub login_route: String,

    /// Request timeout, applied to every call including refresh
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Config {
    /// Create a new configuration with the given base URL
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            asset_origin: "https://kodopo.tech".to_string(),
            refresh_path: "/Auth/Refresh".to_string(),
            login_route: "/login".to_string(),
            timeout: Duration::from_secs(10),
            user_agent: format!("Kodopo-Rust-Client/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the origin used to absolutize asset URLs
    pub fn with_asset_origin(mut self, origin: impl Into<String>) -> Self {
        self.asset_origin = origin.into();
        self
    }

    /// Set the refresh endpoint path
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set custom user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Resolve a request path against the base URL.
    ///
    /// Absolute `http(s)://` URLs are returned unchanged.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Full URL of the refresh endpoint
    pub fn refresh_url(&self) -> String {
        self.url_for(&self.refresh_path)
    }

    /// Whether a request targets the refresh endpoint
    pub fn is_refresh_request(&self, path: &str) -> bool {
        path.contains(self.refresh_path.as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("https://kodopo.tech/api")
    }
}
