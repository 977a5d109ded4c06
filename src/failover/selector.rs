//! Connection selection with failover.
//!
//! # Responsibilities
//! - Walk the registry's candidate order for each connection request
//! - Delegate each attempt to the injected connector
//! - Feed outcomes back into the registry
//!
//! # Design Decisions
//! - The registry lock is never held across a connector call
//! - Per-peer connection failures are absorbed; only exhaustion surfaces
//! - Fatal connector errors short-circuit without touching peer state

use std::sync::Arc;

use crate::failover::connector::Connector;
use crate::failover::types::{FailoverError, FailoverResult};
use crate::health::peer::PeerId;
use crate::health::state::PeerRegistry;
use crate::observability::metrics;

/// Drives a [`PeerRegistry`] to obtain a live connection.
#[derive(Debug)]
pub struct ConnectionSelector<C> {
    registry: Arc<PeerRegistry>,
    connector: C,
}

impl<C: Connector> ConnectionSelector<C> {
    pub fn new(registry: Arc<PeerRegistry>, connector: C) -> Self {
        Self {
            registry,
            connector,
        }
    }

    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Connect to the first candidate that accepts.
    ///
    /// Retry-eligible down peers are tried first (when this caller holds the
    /// retry token), then every up peer in random order. Fails with
    /// [`FailoverError::NoPeersAvailable`] once the sequence is exhausted.
    pub async fn connect(&self) -> FailoverResult<C::Connection> {
        self.ensure_initialized()?;

        let mut attempted = 0usize;
        for peer in self.registry.candidate_order() {
            attempted += 1;
            if let Some(conn) = self.attempt(&peer).await? {
                return Ok(conn);
            }
        }

        Err(self.exhausted(attempted))
    }

    /// Connect by repeatedly sampling one random up peer, without a retry
    /// phase. Down peers only come back through [`connect`](Self::connect)
    /// or [`PeerRegistry::reset`].
    pub async fn connect_random(&self) -> FailoverResult<C::Connection> {
        self.ensure_initialized()?;

        let mut attempted = 0usize;
        while let Some(peer) = self.registry.random_peer() {
            attempted += 1;
            if let Some(conn) = self.attempt(&peer).await? {
                return Ok(conn);
            }
        }

        Err(self.exhausted(attempted))
    }

    /// `Ok(None)` means the peer was marked down and the caller should move on.
    async fn attempt(&self, peer: &PeerId) -> FailoverResult<Option<C::Connection>> {
        match self.connector.connect(peer).await {
            Ok(conn) => {
                self.registry.mark_up(peer);
                Ok(Some(conn))
            }
            Err(e) if e.is_connection_failure() => {
                tracing::info!(
                    pool = %self.registry.pool(),
                    peer = %peer,
                    error = %e,
                    "Peer connection failed"
                );
                self.registry.mark_down(peer);
                Ok(None)
            }
            Err(e) => {
                tracing::error!(
                    pool = %self.registry.pool(),
                    peer = %peer,
                    error = %e,
                    "Non-retryable connector error"
                );
                Err(FailoverError::Connector {
                    peer: peer.clone(),
                    source: e,
                })
            }
        }
    }

    fn ensure_initialized(&self) -> FailoverResult<()> {
        if self.registry.is_initialized() {
            Ok(())
        } else {
            Err(FailoverError::Configuration(format!(
                "pool '{}' used before initialization",
                self.registry.pool()
            )))
        }
    }

    fn exhausted(&self, attempted: usize) -> FailoverError {
        let pool = self.registry.pool().to_string();
        metrics::record_exhausted(&pool);
        tracing::warn!(pool = %pool, attempted, "No available peers");
        FailoverError::NoPeersAvailable { pool }
    }
}
