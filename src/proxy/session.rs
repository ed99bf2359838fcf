//! Session types
//!
//! A session pairs one accepted client connection with the backend
//! connection dialed for it.

use std::fmt;
use std::io;
use tokio::net::TcpStream;

/// One proxied connection pair
///
/// The session owns both connections; the relay consumes it.
pub struct Session<C = TcpStream, B = TcpStream> {
    /// Accepted client connection
    pub(crate) client: C,
    /// Dialed backend connection
    pub(crate) backend: B,
    /// Selection key: the client's remote address
    pub(crate) key: String,
    /// Backend address the connection was dialed from
    pub(crate) backend_addr: String,
}

impl<C, B> Session<C, B> {
    /// Create a session
    pub fn new(client: C, backend: B, key: impl Into<String>, backend_addr: impl Into<String>) -> Self {
        Self {
            client,
            backend,
            key: key.into(),
            backend_addr: backend_addr.into(),
        }
    }

    /// Client remote address used for backend selection
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn backend_addr(&self) -> &str {
        &self.backend_addr
    }
}

impl<C, B> fmt::Debug for Session<C, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("key", &self.key)
            .field("backend_addr", &self.backend_addr)
            .finish_non_exhaustive()
    }
}

/// Relay direction within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToBackend,
    BackendToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientToBackend => write!(f, "client -> backend"),
            Self::BackendToClient => write!(f, "backend -> client"),
        }
    }
}

/// Why a relay direction stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The source closed its side
    Eof,
    /// Reading from the source failed
    ReadError(io::ErrorKind),
    /// Writing to the destination failed
    WriteError(io::ErrorKind),
    /// The other direction ended first and the session was torn down
    TornDown,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eof => write!(f, "closed by peer"),
            Self::ReadError(kind) => write!(f, "read error: {}", kind),
            Self::WriteError(kind) => write!(f, "write error: {}", kind),
            Self::TornDown => write!(f, "torn down"),
        }
    }
}

/// Outcome of one relay direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionReport {
    pub direction: Direction,
    /// Bytes written to the destination
    pub bytes: u64,
    pub termination: Termination,
}

/// Outcome of a whole relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelaySummary {
    /// The direction whose termination tore the session down
    pub first: DirectionReport,
    /// The direction that was cut short
    pub second: DirectionReport,
}

impl RelaySummary {
    /// Report for `direction`
    pub fn report(&self, direction: Direction) -> &DirectionReport {
        if self.first.direction == direction {
            &self.first
        } else {
            &self.second
        }
    }

    pub fn client_to_backend(&self) -> u64 {
        self.report(Direction::ClientToBackend).bytes
    }

    pub fn backend_to_client(&self) -> u64 {
        self.report(Direction::BackendToClient).bytes
    }
}
