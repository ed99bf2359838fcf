//! Proxy server module
//!
//! This module owns the listening socket. Every accepted connection becomes
//! its own task in a `JoinSet`, so a slow or stuck session never delays the
//! next accept, and shutdown can reach every session still running.

use log::{debug, error, info, warn};
use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::balancer::HashSelector;
use crate::common::{ProxyError, Result};
use crate::config::ProxyConfig;
use super::handler::handle_connection;
use super::message::{create_channel, ProxyHandle, ProxyMessage, RunningProxy};
use super::session::RelaySummary;

/// Proxy server structure
///
/// A bound listener together with the backend selector and configuration
/// shared by all sessions.
pub struct Proxy {
    /// Bound listening socket
    listener: TcpListener,
    /// Actual listen address (resolves port 0)
    local_addr: SocketAddr,
    /// Backend selector, shared read-only by all sessions
    selector: Arc<HashSelector>,
    /// Proxy configuration, shared read-only by all sessions
    config: Arc<ProxyConfig>,
}

impl Proxy {
    /// Bind the listen address of `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend list is empty or the address cannot
    /// be bound.
    pub async fn bind(config: Arc<ProxyConfig>) -> Result<Self> {
        let selector = HashSelector::new(config.backends().iter().cloned())?;

        let bound = match config.wildcard_port() {
            // Dual-stack where the OS allows it, IPv4 otherwise
            Some(port) => {
                let candidates = [
                    SocketAddr::from((Ipv6Addr::UNSPECIFIED, port)),
                    SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
                ];
                TcpListener::bind(&candidates[..]).await
            }
            None => TcpListener::bind(config.listen()).await,
        };

        let listener = bound
            .map_err(|source| ProxyError::Bind {
                addr: config.listen().to_string(),
                source,
            })?;
        let local_addr = listener.local_addr()?;

        Ok(Self {
            listener,
            local_addr,
            selector: Arc::new(selector),
            config,
        })
    }

    /// Address the proxy is accepting on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept connections until a fatal listener error
    pub async fn run(self) -> Result<()> {
        // Keep the sender alive so the message branch stays idle
        let (_tx, rx) = create_channel();
        self.run_service(rx, std::future::pending()).await
    }

    /// Accept connections until `shutdown` completes or a fatal listener error
    ///
    /// On shutdown every in-flight session is aborted, which closes its
    /// connections.
    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let (_tx, rx) = create_channel();
        self.run_service(rx, shutdown).await
    }

    /// Run the listener loop on a background task
    pub fn start(self) -> RunningProxy {
        let (tx, rx) = create_channel();
        let handle = ProxyHandle::new(tx, self.local_addr);
        let task = tokio::spawn(self.run_service(rx, std::future::pending()));

        RunningProxy { handle, task }
    }

    async fn run_service<F>(self, mut rx: mpsc::Receiver<ProxyMessage>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("Starting godist on {}", self.local_addr);
        debug!("Dispatching across {} backend(s)", self.selector.backends().len());

        let mut sessions: JoinSet<Result<RelaySummary>> = JoinSet::new();
        tokio::pin!(shutdown);

        let outcome = loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break Ok(());
                }

                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((client_stream, client_addr)) => {
                            let selector = Arc::clone(&self.selector);
                            let config = Arc::clone(&self.config);

                            sessions.spawn(async move {
                                handle_connection(client_stream, client_addr, &selector, &config).await
                            });
                        }
                        Err(e) if is_transient_accept_error(&e) => {
                            warn!("Error accepting connection, continuing: {}", e);
                        }
                        Err(e) => {
                            error!("Error accepting connection: {}", e);
                            break Err(ProxyError::Accept(e));
                        }
                    }
                }

                Some(message) = rx.recv() => {
                    match message {
                        ProxyMessage::ActiveSessions(reply) => {
                            let _ = reply.send(sessions.len());
                        }
                        ProxyMessage::Shutdown => {
                            info!("Received shutdown message");
                            break Ok(());
                        }
                    }
                }

                Some(result) = sessions.join_next() => {
                    match result {
                        Ok(Ok(_)) => {}
                        Ok(Err(e)) => debug!("Session ended with error: {}", e),
                        Err(e) if e.is_panic() => error!("Session task panicked: {}", e),
                        Err(_) => {}
                    }
                }
            }
        };

        if !sessions.is_empty() {
            info!("Closing {} active session(s)", sessions.len());
        }
        sessions.shutdown().await;

        info!("Proxy service stopped");
        outcome
    }
}

/// Accept errors that concern one connection attempt, not the listener
fn is_transient_accept_error(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}
