//! Service configuration for saferoute
//!
//! The directions provider and the risk-annotation service live behind
//! separate, independently configurable base URLs.

/// Configuration for the remote services one orchestration talks to
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    /// Directions provider authentication token
    pub api_key: String,

    /// Base URL of the directions provider
    pub directions_base_url: String,

    /// Base URL of the risk-annotation service
    pub risk_base_url: String,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            directions_base_url: "https://open.mapquestapi.com".to_string(),
            risk_base_url: "http://localhost:8080".to_string(),
        }
    }
}

impl RoutingConfig {
    /// Create a configuration with the given API key and default service URLs
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RoutingConfig::default();
        assert_eq!(config.directions_base_url, "https://open.mapquestapi.com");
        assert_eq!(config.risk_base_url, "http://localhost:8080");
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn test_new_sets_api_key() {
        let config = RoutingConfig::new("test-key");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.directions_base_url, "https://open.mapquestapi.com");
    }
}
