//! Client configuration.

/// Base URL of the backend when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8081";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "FLEET_API_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Read `FLEET_API_URL`, falling back to [`DEFAULT_BASE_URL`] when the
    /// variable is unset or blank.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(BASE_URL_ENV)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self { base_url }
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
    fn lookup_overrides_default() {
        let config = ClientConfig::from_lookup(|_| Some("http://fleet.internal:9000".to_string()));
        assert_eq!(config.base_url, "http://fleet.internal:9000");
    }

    #[test]
    fn blank_value_falls_back() {
        let config = ClientConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(config, ClientConfig::default());
        let config = ClientConfig::from_lookup(|_| None);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
