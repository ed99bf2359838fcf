//! godist: hash-dispatching TCP load-balancing proxy
//!
//! The proxy accepts client connections on one address, picks a backend by
//! hashing the client's `host:port` (32-bit FNV-1a modulo the number of
//! backends) and relays bytes in both directions without looking at them.
//! The same client address always reaches the same backend for as long as
//! the backend list stays the same.
//!
//! # Example
//!
//! ```no_run
//! use godist::{Proxy, Result};
//! use godist::config::ProxyConfig;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ProxyConfig::load("godist.conf")?;
//!
//!     let proxy = Proxy::bind(Arc::new(config)).await?;
//!     proxy.run().await
//! }
//! ```

// Public modules
pub mod balancer;
pub mod common;
pub mod config;
pub mod proxy;

// Re-export commonly used structures and functions for convenience
pub use balancer::{select, HashSelector};
pub use common::{ProxyError, Result};
pub use proxy::{Proxy, ProxyHandle, RunningProxy};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
