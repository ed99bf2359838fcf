//! Connection handler module
//!
//! This module turns an accepted client connection into a session: it picks
//! the backend, dials it and hands both connections to the relay.

use log::debug;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::balancer::HashSelector;
use crate::common::{ProxyError, Result};
use crate::config::ProxyConfig;
use super::forwarder::relay;
use super::session::{RelaySummary, Session};

/// Handle a single client connection
///
/// # Parameters
///
/// * `client_stream` - Accepted client connection; always closed on return
/// * `client_addr` - Client remote address, the backend selection key
/// * `selector` - Backend selector
/// * `config` - Proxy configuration
///
/// # Returns
///
/// Returns the relay summary once the session has ended.
///
/// # Errors
///
/// Returns an error if the backend cannot be reached. The client connection
/// is closed without any data being relayed.
pub async fn handle_connection(
    client_stream: TcpStream,
    client_addr: SocketAddr,
    selector: &HashSelector,
    config: &ProxyConfig,
) -> Result<RelaySummary> {
    let key = client_addr.to_string();
    let backend_addr = selector.select(&key);

    let backend_stream = match dial_backend(backend_addr, config.connect_timeout()).await {
        Ok(stream) => stream,
        Err(e) => {
            drop(client_stream);
            debug!("Closed client {}: {}", key, e);
            return Err(e);
        }
    };

    let backend_peer = backend_stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| backend_addr.to_string());
    debug!("New proxy session with client {} and server {}", key, backend_peer);

    let session = Session::new(client_stream, backend_stream, key, backend_addr);
    let summary = relay(session, config.buffer_size()).await?;

    debug!(
        "Proxy session closed with client {} and server {} ({} bytes up, {} bytes down)",
        client_addr,
        backend_peer,
        summary.client_to_backend(),
        summary.backend_to_client()
    );

    Ok(summary)
}

/// Connect to a backend
///
/// Without a timeout the dial waits as long as the operating system does.
pub async fn dial_backend(backend_addr: &str, connect_timeout: Option<Duration>) -> Result<TcpStream> {
    let connect = TcpStream::connect(backend_addr);

    let result = match connect_timeout {
        Some(limit) => timeout(limit, connect)
            .await
            .map_err(|_| ProxyError::DialTimeout {
                backend: backend_addr.to_string(),
                timeout: limit,
            })?,
        None => connect.await,
    };

    result.map_err(|source| ProxyError::Dial {
        backend: backend_addr.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Address with nothing listening on it
    async fn closed_port() -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    }

    /// Accepted server-side stream and the client address the server saw
    async fn accepted_pair() -> (TcpStream, TcpStream, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let client = TcpStream::connect(listener.local_addr().unwrap()).await.unwrap();
        let (server, peer) = listener.accept().await.unwrap();
        (client, server, peer)
    }

    #[tokio::test]
    async fn test_dial_refused() {
        let addr = closed_port().await;

        let err = dial_backend(&addr.to_string(), None).await.unwrap_err();
        assert!(matches!(err, ProxyError::Dial { .. }));
    }

    #[tokio::test]
    async fn test_dial_failure_closes_client() {
        let backend = closed_port().await;
        let selector = HashSelector::new([backend.to_string()]).unwrap();
        let config = ProxyConfig::new("127.0.0.1:0", [backend.to_string()])
            .with_connect_timeout(Duration::from_secs(2));

        let (mut client, server, peer) = accepted_pair().await;
        let result = handle_connection(server, peer, &selector, &config).await;
        assert!(result.is_err());

        let mut buf = [0u8; 8];
        let read = tokio::time::timeout(Duration::from_secs(5), client.read(&mut buf))
            .await
            .expect("client connection was left open");
        // Either an orderly close or a reset, never a hang
        assert!(matches!(read, Ok(0) | Err(_)));
    }

    #[tokio::test]
    async fn test_session_relays_to_selected_backend() {
        let backend_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let backend_addr = backend_listener.local_addr().unwrap().to_string();
        let selector = HashSelector::new([backend_addr.clone()]).unwrap();
        let config = ProxyConfig::new("127.0.0.1:0", [backend_addr]);

        let (mut client, server, peer) = accepted_pair().await;
        let session = tokio::spawn(async move {
            handle_connection(server, peer, &selector, &config).await
        });

        let (mut backend, _) = backend_listener.accept().await.unwrap();

        client.write_all(b"hello").await.unwrap();
        let mut buf = [0u8; 5];
        backend.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");

        backend.write_all(b"world").await.unwrap();
        client.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"world");

        drop(client);
        let summary = tokio::time::timeout(Duration::from_secs(5), session)
            .await
            .expect("session did not end")
            .unwrap()
            .unwrap();
        assert_eq!(summary.client_to_backend(), 5);
        assert_eq!(summary.backend_to_client(), 5);

        // The backend connection was closed as well
        let n = backend.read(&mut buf).await.unwrap_or(0);
        assert_eq!(n, 0);
    }
}
