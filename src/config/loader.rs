//! Configuration loading functionality
//!
//! This module reads the JSON configuration file.

use log::{debug, warn};
use std::fs;
use std::path::Path;

use crate::config::error::{ConfigError, Result};
use crate::config::validator::{validate_config, ConfigValidator};
use crate::config::ProxyConfig;

impl ProxyConfig {
    /// Parse a configuration from a JSON string
    ///
    /// `path` is only used in error messages.
    pub fn from_json(content: &str, path: &Path) -> Result<Self> {
        serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read and parse a configuration file without validating it
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_json(&content, path)
    }

    /// Read, parse and validate a configuration file
    ///
    /// Validation problems are reported here, before any socket is opened.
    /// Non-fatal findings are logged as warnings.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config = Self::from_file(path)?;
        validate_config(&config)?;

        for warning in config.check_warnings() {
            warn!("{}", warning);
        }

        debug!(
            "Loaded configuration from {}: listen on {}, {} backend(s)",
            path.display(),
            config.listen(),
            config.backends().len()
        );

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_canonical_fields() {
        let file = write_config(r#"{
            "listen": "127.0.0.1:9000",
            "backends": ["127.0.0.1:9001", "127.0.0.1:9002"],
            "buffer_size": 4096,
            "connect_timeout": 3
        }"#);

        let config = ProxyConfig::load(file.path()).unwrap();

        assert_eq!(config.listen(), "127.0.0.1:9000");
        assert_eq!(config.backends(), ["127.0.0.1:9001", "127.0.0.1:9002"]);
        assert_eq!(config.buffer_size(), 4096);
        assert_eq!(config.connect_timeout(), Some(std::time::Duration::from_secs(3)));
    }

    #[test]
    fn test_load_legacy_field_names() {
        let file = write_config(r#"{"Host": "0.0.0.0:8080", "Servers": ["10.0.0.1:80", "10.0.0.2:80"]}"#);

        let config = ProxyConfig::load(file.path()).unwrap();

        assert_eq!(config.listen(), "0.0.0.0:8080");
        assert_eq!(config.backends().len(), 2);
        assert_eq!(config.buffer_size(), 2048);
        assert_eq!(config.connect_timeout(), None);
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let file = write_config(r#"{"listen": "127.0.0.1:9000", "backends": ["127.0.0.1:9001"], "comment": "x"}"#);

        assert!(ProxyConfig::load(file.path()).is_ok());
    }

    #[test]
    fn test_empty_backends_fail_at_load() {
        let file = write_config(r#"{"listen": "127.0.0.1:9000", "backends": []}"#);

        let err = ProxyConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyBackends));
    }

    #[test]
    fn test_malformed_json() {
        let file = write_config(r#"{"listen": "127.0.0.1:9000", "backends": ["#);

        let err = ProxyConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn test_missing_field() {
        let file = write_config(r#"{"listen": "127.0.0.1:9000"}"#);

        let err = ProxyConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("backends"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("godist.conf");

        let err = ProxyConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }
}
