//! Proxy message types
//!
//! A running listener loop is controlled through messages rather than shared
//! state: the handle only owns a channel sender.

use std::net::SocketAddr;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::common::{ProxyError, Result};

/// Messages that can be sent to the listener loop
#[derive(Debug)]
pub enum ProxyMessage {
    /// Report the number of sessions still running
    ActiveSessions(oneshot::Sender<usize>),
    /// Stop accepting and abort every in-flight session
    Shutdown,
}

/// Proxy control handle
///
/// Returned by [`Proxy::start`](super::Proxy::start). Dropping every clone of
/// the handle does not stop the proxy.
#[derive(Debug, Clone)]
pub struct ProxyHandle {
    /// Message sender
    sender: mpsc::Sender<ProxyMessage>,
    /// Bound listen address
    local_addr: SocketAddr,
}

impl ProxyHandle {
    pub(crate) fn new(sender: mpsc::Sender<ProxyMessage>, local_addr: SocketAddr) -> Self {
        Self { sender, local_addr }
    }

    /// Address the proxy is accepting on
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Send a message to the listener loop
    pub async fn send(&self, message: ProxyMessage) -> Result<()> {
        self.sender.send(message).await
            .map_err(|_| ProxyError::Other("Proxy service is no longer running".to_string()))
    }

    /// Number of sessions whose task has not finished yet
    pub async fn active_sessions(&self) -> Result<usize> {
        let (tx, rx) = oneshot::channel();
        self.send(ProxyMessage::ActiveSessions(tx)).await?;
        rx.await
            .map_err(|_| ProxyError::Other("Proxy service stopped before replying".to_string()))
    }

    /// Ask the listener loop to shut down
    ///
    /// Returns once the message is queued; await the task returned by
    /// [`Proxy::start`](super::Proxy::start) to wait for completion.
    pub async fn shutdown(&self) -> Result<()> {
        self.send(ProxyMessage::Shutdown).await
    }
}

/// Running proxy: the control handle plus the listener task
#[derive(Debug)]
pub struct RunningProxy {
    pub handle: ProxyHandle,
    pub task: JoinHandle<Result<()>>,
}

impl RunningProxy {
    /// Shut down and wait for the listener loop to finish
    pub async fn stop(self) -> Result<()> {
        self.handle.shutdown().await?;
        self.task
            .await
            .map_err(|e| ProxyError::Other(format!("Proxy task failed: {}", e)))?
    }
}

/// Create a new proxy message channel
pub(crate) fn create_channel() -> (mpsc::Sender<ProxyMessage>, mpsc::Receiver<ProxyMessage>) {
    mpsc::channel(100)
}
