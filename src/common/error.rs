//! Error handling module
//!
//! This module defines the error types and result type aliases used in the application.

use std::io;
use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigError;

/// godist error type
#[derive(Error, Debug)]
pub enum ProxyError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The listening socket could not be bound
    #[error("Failed to listen on {addr}: {source}")]
    Bind {
        /// Configured listen address
        addr: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The listening socket failed in a way that cannot be retried
    #[error("Error accepting connection: {0}")]
    Accept(#[source] io::Error),

    /// The selected backend refused or failed the connection
    #[error("Could not connect to server {backend}: {source}")]
    Dial {
        /// Backend address
        backend: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// The selected backend did not answer within the connect timeout
    #[error("Connection to server {backend} timed out after {timeout:?}")]
    DialTimeout {
        /// Backend address
        backend: String,
        /// Configured connect timeout
        timeout: Duration,
    },

    /// Other error
    #[error("Other error: {0}")]
    Other(String),
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `ProxyError`.
pub type Result<T> = std::result::Result<T, ProxyError>;
