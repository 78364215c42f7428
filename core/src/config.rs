//! Client configuration, built once at startup and never mutated.

use std::env;

/// Base URL used when `API_BASE_URL` is not set.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5001";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend root, without a trailing slash.
    pub base_url: String,
    /// Headers attached to every request.
    pub default_headers: Vec<(String, String)>,
    /// Treat a non-2xx response without an `error` field as a failure
    /// instead of returning its `data`.
    pub strict_status: bool,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_headers: vec![("content-type".to_string(), "application/json".to_string())],
            strict_status: false,
        }
    }

    /// Reads `API_BASE_URL` and `API_STRICT_STATUS` from the process environment.
    pub fn from_env() -> Self {
        let base_url = env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let strict_status = env::var("API_STRICT_STATUS")
            .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "yes"))
            .unwrap_or(false);
        Self::new(&base_url).with_strict_status(strict_status)
    }

    pub fn with_strict_status(mut self, strict_status: bool) -> Self {
        self.strict_status = strict_status;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_stripped() {
        let config = ClientConfig::new("http://localhost:5001/");
        assert_eq!(config.base_url, "http://localhost:5001");
    }

    #[test]
    fn default_points_at_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(!config.strict_status);
        assert_eq!(
            config.default_headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
    }
}
