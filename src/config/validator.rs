//! Configuration validator
//!
//! This module provides functionality for validating configuration.

use std::collections::HashSet;

use crate::config::error::{ConfigError, Result};
use crate::config::ProxyConfig;

/// Validate the configuration
pub fn validate_config(config: &ProxyConfig) -> Result<()> {
    // Validate network settings
    validate_network_settings(config)?;

    // Validate relay settings
    validate_relay_settings(config)?;

    Ok(())
}

/// Validate network settings
fn validate_network_settings(config: &ProxyConfig) -> Result<()> {
    if config.listen().trim().is_empty() {
        return Err(ConfigError::MissingRequiredValue("listen".to_string()));
    }
    validate_host_port("listen", config.listen())?;

    if config.backends().is_empty() {
        return Err(ConfigError::EmptyBackends);
    }

    for backend in config.backends() {
        validate_host_port("backends", backend)?;
    }

    Ok(())
}

/// Validate relay settings
fn validate_relay_settings(config: &ProxyConfig) -> Result<()> {
    if config.buffer_size() == 0 {
        return Err(ConfigError::InvalidValue(
            "buffer_size".to_string(),
            "Buffer size must be greater than 0".to_string()
        ));
    }

    if config.connect_timeout().is_some_and(|timeout| timeout.is_zero()) {
        return Err(ConfigError::InvalidValue(
            "connect_timeout".to_string(),
            "Connection timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Check that `addr` looks like `host:port`
///
/// Host names are resolved when the socket is used, so only the shape is
/// checked here.
fn validate_host_port(field: &str, addr: &str) -> Result<()> {
    let invalid = |reason: &str| {
        ConfigError::InvalidValue(field.to_string(), format!("'{}' {}", addr, reason))
    };

    let (host, port) = addr
        .rsplit_once(':')
        .ok_or_else(|| invalid("is not of the form host:port"))?;

    // An empty host is allowed for the listen address (":9000" binds all interfaces)
    if host.is_empty() && field != "listen" {
        return Err(invalid("has no host"));
    }

    port.parse::<u16>()
        .map_err(|_| invalid("has an invalid port"))?;

    Ok(())
}

/// Configuration validator trait
pub trait ConfigValidator {
    /// Check configuration for warnings
    fn check_warnings(&self) -> Vec<String>;
}

impl ConfigValidator for ProxyConfig {
    fn check_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        // Duplicates skew the hash distribution towards the repeated backend
        let mut seen = HashSet::new();
        for backend in self.backends() {
            if !seen.insert(backend.as_str()) {
                warnings.push(format!("Backend {} is listed more than once", backend));
            }
        }

        if self.backends().iter().any(|backend| backend == self.listen()) {
            warnings.push(format!(
                "Listen address {} is also listed as a backend",
                self.listen()
            ));
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = ProxyConfig::new("127.0.0.1:9000", ["127.0.0.1:9001", "backend.local:80"]);
        assert!(validate_config(&config).is_ok());
        assert!(config.check_warnings().is_empty());
    }

    #[test]
    fn test_empty_backends() {
        let config = ProxyConfig::new("127.0.0.1:9000", Vec::<String>::new());
        assert!(matches!(validate_config(&config), Err(ConfigError::EmptyBackends)));
    }

    #[test]
    fn test_missing_listen() {
        let config = ProxyConfig::new("", ["127.0.0.1:9001"]);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingRequiredValue(_))
        ));
    }

    #[test]
    fn test_listen_without_host() {
        let config = ProxyConfig::new(":9000", ["127.0.0.1:9001"]);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_invalid_backend_addresses() {
        for backend in ["127.0.0.1", "127.0.0.1:http", ":9001", "127.0.0.1:70000"] {
            let config = ProxyConfig::new("127.0.0.1:9000", [backend]);
            match validate_config(&config) {
                Err(ConfigError::InvalidValue(field, _)) => assert_eq!(field, "backends"),
                other => panic!("{} should be rejected, got {:?}", backend, other),
            }
        }
    }

    #[test]
    fn test_ipv6_backend() {
        let config = ProxyConfig::new("[::1]:9000", ["[::1]:9001"]);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_zero_buffer_size() {
        let config = ProxyConfig::new("127.0.0.1:9000", ["127.0.0.1:9001"]).with_buffer_size(0);
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidValue(field, _)) if field == "buffer_size"
        ));
    }

    #[test]
    fn test_zero_connect_timeout_from_file() {
        let config = ProxyConfig::from_json(
            r#"{"listen": "127.0.0.1:9000", "backends": ["127.0.0.1:9001"], "connect_timeout": 0}"#,
            std::path::Path::new("inline"),
        )
        .unwrap();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidValue(field, _)) if field == "connect_timeout"
        ));
    }

    #[test]
    fn test_warnings() {
        let config = ProxyConfig::new(
            "127.0.0.1:9000",
            ["127.0.0.1:9001", "127.0.0.1:9001", "127.0.0.1:9000"],
        );
        let warnings = config.check_warnings();

        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("more than once"));
        assert!(warnings[1].contains("also listed as a backend"));
    }
}
