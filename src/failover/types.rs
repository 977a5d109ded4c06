//! Failover error taxonomy.

use std::time::Duration;
use thiserror::Error;

use crate::health::peer::PeerId;

/// Failure reported by a [`Connector`](crate::failover::Connector) for one peer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    /// The peer actively refused the connection.
    #[error("Connection refused: {0}")]
    Refused(String),

    /// The attempt did not complete within the connector's deadline.
    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),

    /// Network-level failure (no route, reset, DNS).
    #[error("Peer unreachable: {0}")]
    Unreachable(String),

    /// The peer was reached but rejected our credentials.
    #[error("Authentication rejected: {0}")]
    Auth(String),

    /// Local setup problem that no other peer can fix.
    #[error("Peer misconfigured: {0}")]
    Misconfigured(String),
}

impl ConnectError {
    /// Connection-level failures mark the peer down and move on to the next
    /// candidate. Anything else is surfaced to the caller immediately.
    pub fn is_connection_failure(&self) -> bool {
        !matches!(self, ConnectError::Misconfigured(_))
    }
}

/// Errors surfaced by the failover selector.
#[derive(Debug, Error)]
pub enum FailoverError {
    /// Every candidate failed, or no peer was up to begin with.
    #[error("No available peers in pool '{pool}'")]
    NoPeersAvailable { pool: String },

    /// Invalid peer list, interval, or use of an uninitialized registry.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The connector reported a failure that retrying other peers cannot fix.
    #[error("Peer {peer} failed with non-retryable error: {source}")]
    Connector { peer: PeerId, source: ConnectError },
}

/// Result type for failover operations.
pub type FailoverResult<T> = Result<T, FailoverError>;
