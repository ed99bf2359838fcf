//! Common module
//!
//! This module contains the error types and logging setup shared by the
//! configuration layer, the balancer and the proxy.

pub mod error;
pub mod log;

// Re-export commonly used types and functions
pub use error::{ProxyError, Result};
pub use log::init_logger;
