//! Proxy service module
//!
//! This module implements the core of the proxy: the listener loop, session
//! establishment and the bidirectional byte relay.

pub mod server;
mod handler;
mod forwarder;
mod message;
mod session;

pub use server::Proxy;
pub use handler::{dial_backend, handle_connection};
pub use forwarder::relay;
pub use message::{ProxyHandle, ProxyMessage, RunningProxy};
pub use session::{Direction, DirectionReport, RelaySummary, Session, Termination};
