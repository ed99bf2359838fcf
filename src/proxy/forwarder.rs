//! Data forwarding module
//!
//! This module relays bytes between the two connections of a session.
//!
//! Each direction runs as its own task and copies every chunk it reads
//! straight to the other side. When one direction stops, the other is told to
//! stop too; the relay returns once both have dropped their halves of the
//! connections, so both sockets are closed by then.

use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};

use crate::common::{ProxyError, Result};
use super::session::{Direction, DirectionReport, RelaySummary, Session, Termination};

/// Relay bytes in both directions until the session ends
///
/// # Parameters
///
/// * `session` - Session to relay; both connections are closed on return
/// * `buffer_size` - Maximum bytes read per chunk
///
/// # Returns
///
/// Returns per-direction byte counts, the first entry being the direction
/// that ended the session.
///
/// # Errors
///
/// Returns an error only if a direction task died without reporting.
pub async fn relay<C, B>(session: Session<C, B>, buffer_size: usize) -> Result<RelaySummary>
where
    C: AsyncRead + AsyncWrite + Send + 'static,
    B: AsyncRead + AsyncWrite + Send + 'static,
{
    let Session { client, backend, key, backend_addr } = session;

    let (client_reader, client_writer) = tokio::io::split(client);
    let (backend_reader, backend_writer) = tokio::io::split(backend);

    // One report per direction
    let (done_tx, mut done_rx) = mpsc::channel(2);
    let (teardown_tx, teardown_rx) = watch::channel(false);

    tokio::spawn(relay_direction(
        client_reader,
        backend_writer,
        Direction::ClientToBackend,
        format!("{} -> {}", key, backend_addr),
        buffer_size,
        teardown_rx.clone(),
        done_tx.clone(),
    ));
    tokio::spawn(relay_direction(
        backend_reader,
        client_writer,
        Direction::BackendToClient,
        format!("{} -> {}", backend_addr, key),
        buffer_size,
        teardown_rx,
        done_tx,
    ));

    let first = done_rx.recv().await;

    // Cut the other direction short; it drops its halves and reports
    let _ = teardown_tx.send(true);

    let second = done_rx.recv().await;

    match (first, second) {
        (Some(first), Some(second)) => Ok(RelaySummary { first, second }),
        _ => Err(ProxyError::Other(format!(
            "Relay between {} and {} lost a direction task",
            key, backend_addr
        ))),
    }
}

/// Copy from `from` to `to` until EOF, an I/O error or teardown
async fn relay_direction<R, W>(
    mut from: R,
    mut to: W,
    direction: Direction,
    label: String,
    buffer_size: usize,
    mut teardown: watch::Receiver<bool>,
    done: mpsc::Sender<DirectionReport>,
) where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buffer = vec![0u8; buffer_size];
    let mut bytes = 0u64;

    let termination = loop {
        let n = tokio::select! {
            biased;
            _ = teardown.changed() => break Termination::TornDown,
            result = from.read(&mut buffer) => match result {
                Ok(0) => break Termination::Eof,
                Ok(n) => n,
                Err(e) => break Termination::ReadError(e.kind()),
            },
        };

        tokio::select! {
            biased;
            _ = teardown.changed() => break Termination::TornDown,
            result = to.write_all(&buffer[..n]) => {
                if let Err(e) = result {
                    break Termination::WriteError(e.kind());
                }
            }
        }

        bytes += n as u64;
        trace!("{} bytes sent {}", n, label);
    };

    // Halves must be gone before the report so the relay never returns with an open socket
    drop(from);
    drop(to);

    debug!("{} ({}) {}, {} bytes transferred", label, direction, termination, bytes);

    let _ = done.send(DirectionReport { direction, bytes, termination }).await;
}
