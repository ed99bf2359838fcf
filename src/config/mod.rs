//! Configuration module
//!
//! This module holds the proxy configuration: the listen address, the ordered
//! backend list and a few relay settings. The configuration is loaded once at
//! startup, validated, and then shared read-only by every component.

// Submodules
mod defaults;
mod error;
mod loader;
mod validator;

// Re-export types and traits
pub use self::defaults::{DEFAULT_CONFIG_FILE, LOG_LEVEL_STR, VERBOSE_LOG_LEVEL_STR};
pub use self::error::{ConfigError, Result};
pub use self::validator::ConfigValidator;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Proxy configuration
///
/// The JSON field names `listen`/`backends` are canonical; the `Host`/`Servers`
/// spelling of older configuration files is accepted as well. Fields that are
/// not recognised are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Listen address (host:port)
    #[serde(alias = "Host", alias = "host")]
    listen: String,

    /// Ordered backend addresses (host:port)
    #[serde(alias = "Servers", alias = "servers")]
    backends: Vec<String>,

    /// Relay read buffer size in bytes
    #[serde(default = "defaults::buffer_size")]
    buffer_size: usize,

    /// Backend connect timeout in seconds
    #[serde(default = "defaults::connect_timeout", skip_serializing_if = "Option::is_none")]
    connect_timeout: Option<u64>,

    /// Verbose diagnostics; set from the command line, never from the file
    #[serde(skip)]
    verbose: bool,
}

impl ProxyConfig {
    /// Create a configuration with default relay settings
    pub fn new<S: Into<String>>(listen: impl Into<String>, backends: impl IntoIterator<Item = S>) -> Self {
        Self {
            listen: listen.into(),
            backends: backends.into_iter().map(Into::into).collect(),
            buffer_size: defaults::buffer_size(),
            connect_timeout: defaults::connect_timeout(),
            verbose: false,
        }
    }

    /// Set the backend connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout.as_secs().max(1));
        self
    }

    /// Set the relay buffer size
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Enable or disable verbose diagnostics
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    #[inline]
    pub fn listen(&self) -> &str {
        &self.listen
    }

    /// Port of a bare `:port` listen address
    ///
    /// Such an address listens on every interface, IPv6 and IPv4.
    pub fn wildcard_port(&self) -> Option<u16> {
        self.listen.strip_prefix(':')?.parse().ok()
    }

    #[inline]
    pub fn backends(&self) -> &[String] {
        &self.backends
    }

    #[inline]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Backend connect timeout, `None` when the dial is unbounded
    #[inline]
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout.map(Duration::from_secs)
    }

    #[inline]
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Default log filter for this configuration
    pub fn log_level(&self) -> &'static str {
        log_level(self.verbose)
    }
}

/// Default log filter for the given verbosity
///
/// Needed before a configuration exists, so that loading it can log.
pub fn log_level(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_LOG_LEVEL_STR
    } else {
        LOG_LEVEL_STR
    }
}
