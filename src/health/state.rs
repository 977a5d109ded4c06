//! Peer health state machine.
//!
//! # States
//! - Up: peer is offered to the random selection pass
//! - Down: peer is excluded until its retry time elapses
//!
//! # State Transitions
//! ```text
//! Up → Down: connection attempt failed (retry_at = now + check_interval)
//! Down → Down: retry attempt failed (retry_at refreshed)
//! Down → Up: any connection attempt succeeded
//! ```
//!
//! # Invariant
//! `up ∩ down = ∅` and `up ∪ down = peers` after every completed call. The
//! state lock is held only for the set/map updates, never across I/O.

use rand::seq::{IteratorRandom, SliceRandom};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::AtomicBool;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::failover::types::{FailoverError, FailoverResult};
use crate::health::candidates::{CandidateOrder, RetryGuard};
use crate::health::peer::PeerId;
use crate::observability::metrics;

/// Longest accepted check interval.
pub const MAX_CHECK_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Debug, Default)]
struct PeerState {
    /// Every configured peer. Fixed after initialization.
    peers: BTreeSet<PeerId>,
    up: BTreeSet<PeerId>,
    /// Down peers and the instant they become retry-eligible.
    down: BTreeMap<PeerId, Instant>,
    check_interval: Duration,
}

/// Shared up/down bookkeeping for one pool of peers.
///
/// Created once per pool and shared through an `Arc` by every caller that
/// connects to that pool.
#[derive(Debug)]
pub struct PeerRegistry {
    pool: String,
    state: Mutex<PeerState>,
    /// Held by the single caller currently probing down peers.
    retrying: AtomicBool,
}

impl PeerRegistry {
    /// Create an uninitialized registry for the named pool.
    pub fn new(pool: impl Into<String>) -> Self {
        Self {
            pool: pool.into(),
            state: Mutex::new(PeerState::default()),
            retrying: AtomicBool::new(false),
        }
    }

    /// Create and initialize a registry in one step.
    pub fn with_peers<I>(pool: impl Into<String>, peers: I, check_interval: Duration) -> FailoverResult<Self>
    where
        I: IntoIterator,
        I::Item: Into<PeerId>,
    {
        let registry = Self::new(pool);
        registry.initialize(peers, check_interval)?;
        Ok(registry)
    }

    /// Populate the registry with its peer set.
    ///
    /// Only the first call has any effect; later calls return `Ok(false)` and
    /// leave the existing state untouched, whatever their arguments.
    pub fn initialize<I>(&self, peers: I, check_interval: Duration) -> FailoverResult<bool>
    where
        I: IntoIterator,
        I::Item: Into<PeerId>,
    {
        let mut state = self.lock();
        if !state.peers.is_empty() {
            tracing::debug!(pool = %self.pool, "Re-initialization attempted, keeping existing peer state");
            return Ok(false);
        }

        let peers: BTreeSet<PeerId> = peers.into_iter().map(Into::into).collect();
        if peers.is_empty() {
            return Err(FailoverError::Configuration(format!(
                "pool '{}' has no peers",
                self.pool
            )));
        }
        if check_interval.is_zero() {
            return Err(FailoverError::Configuration(format!(
                "pool '{}' check interval must be positive",
                self.pool
            )));
        }
        if check_interval > MAX_CHECK_INTERVAL || Instant::now().checked_add(check_interval).is_none() {
            return Err(FailoverError::Configuration(format!(
                "pool '{}' check interval must not exceed {}s",
                self.pool,
                MAX_CHECK_INTERVAL.as_secs()
            )));
        }

        state.check_interval = check_interval;
        state.up = peers.clone();
        state.down.clear();
        state.peers = peers;
        let up = state.up.len();
        metrics::record_peers_up(&self.pool, up);
        drop(state);

        tracing::info!(
            pool = %self.pool,
            peers = up,
            check_interval_secs = check_interval.as_secs(),
            "Peer registry initialized"
        );
        Ok(true)
    }

    pub fn is_initialized(&self) -> bool {
        !self.lock().peers.is_empty()
    }

    /// Name of the pool this registry tracks.
    pub fn pool(&self) -> &str {
        &self.pool
    }

    pub fn check_interval(&self) -> Duration {
        self.lock().check_interval
    }

    /// All configured peers, sorted.
    pub fn peers(&self) -> Vec<PeerId> {
        self.lock().peers.iter().cloned().collect()
    }

    /// Return every down peer to the up set.
    ///
    /// Not atomic with respect to in-flight connection attempts; intended for
    /// test setup and administrative recovery.
    pub fn reset(&self) {
        let mut state = self.lock();
        let recovered = std::mem::take(&mut state.down);
        let count = recovered.len();
        state.up.extend(recovered.into_keys());
        metrics::record_peers_up(&self.pool, state.up.len());
        drop(state);

        tracing::info!(pool = %self.pool, recovered = count, "Peer state reset");
    }

    /// Record a successful connection to `peer`.
    pub fn mark_up(&self, peer: &PeerId) {
        let mut state = self.lock();
        if !state.peers.contains(peer) {
            drop(state);
            tracing::warn!(pool = %self.pool, peer = %peer, "Ignoring mark up for unknown peer");
            return;
        }
        let was_down = state.down.remove(peer).is_some();
        state.up.insert(peer.clone());
        metrics::record_peers_up(&self.pool, state.up.len());
        drop(state);

        if was_down {
            metrics::record_peer_transition(&self.pool, "up");
        }
        tracing::info!(pool = %self.pool, peer = %peer, state = "up", "Marked peer as up");
    }

    /// Record a failed connection to `peer` and schedule its next retry.
    ///
    /// A peer that was already down gets a fresh retry time.
    pub fn mark_down(&self, peer: &PeerId) {
        let mut state = self.lock();
        if !state.peers.contains(peer) {
            drop(state);
            tracing::warn!(pool = %self.pool, peer = %peer, "Ignoring mark down for unknown peer");
            return;
        }
        let check_interval = state.check_interval;
        let now = Instant::now();
        let retry_at = now.checked_add(check_interval).unwrap_or_else(|| {
            tracing::error!(pool = %self.pool, peer = %peer, "Retry time out of range, retrying immediately");
            now
        });
        let was_up = state.up.remove(peer);
        state.down.insert(peer.clone(), retry_at);
        metrics::record_peers_up(&self.pool, state.up.len());
        drop(state);

        if was_up {
            metrics::record_peer_transition(&self.pool, "down");
            tracing::info!(
                pool = %self.pool,
                peer = %peer,
                state = "down",
                retry_in_secs = check_interval.as_secs(),
                "Marked peer as down"
            );
        } else {
            tracing::info!(
                pool = %self.pool,
                peer = %peer,
                state = "down",
                retry_in_secs = check_interval.as_secs(),
                "Peer still down"
            );
        }
    }

    /// Ordered attempt sequence for one connection attempt: retry-eligible
    /// down peers first (when this caller wins the retry token), then every
    /// up peer in random order.
    pub fn candidate_order(&self) -> CandidateOrder<'_> {
        CandidateOrder::new(self)
    }

    /// Sample one up peer uniformly. `None` when no peer is up.
    pub fn random_peer(&self) -> Option<PeerId> {
        let state = self.lock();
        state.up.iter().choose(&mut rand::thread_rng()).cloned()
    }

    pub fn is_up(&self, peer: &PeerId) -> bool {
        self.lock().up.contains(peer)
    }

    pub fn is_down(&self, peer: &PeerId) -> bool {
        self.lock().down.contains_key(peer)
    }

    /// Instant at which a down peer becomes retry-eligible.
    pub fn retry_at(&self, peer: &PeerId) -> Option<Instant> {
        self.lock().down.get(peer).copied()
    }

    /// Consistent point-in-time view of the partition.
    pub fn snapshot(&self) -> PoolSnapshot {
        let state = self.lock();
        let now = Instant::now();
        PoolSnapshot {
            pool: self.pool.clone(),
            up: state.up.iter().cloned().collect(),
            down: state
                .down
                .iter()
                .map(|(peer, retry_at)| DownPeer {
                    peer: peer.clone(),
                    retry_in_secs: retry_at.saturating_duration_since(now).as_secs(),
                })
                .collect(),
        }
    }

    pub(crate) fn try_retry_pass(&self) -> Option<RetryGuard<'_>> {
        RetryGuard::try_acquire(&self.retrying)
    }

    /// Down peers whose retry time is at or before `now`, earliest first.
    pub(crate) fn retry_eligible(&self, now: Instant) -> Vec<PeerId> {
        let state = self.lock();
        let mut eligible: Vec<(Instant, PeerId)> = state
            .down
            .iter()
            .filter(|(_, retry_at)| **retry_at <= now)
            .map(|(peer, retry_at)| (*retry_at, peer.clone()))
            .collect();
        drop(state);
        eligible.sort();
        eligible.into_iter().map(|(_, peer)| peer).collect()
    }

    /// Up peers in a uniformly random order.
    pub(crate) fn shuffled_up(&self) -> Vec<PeerId> {
        let mut up: Vec<PeerId> = self.lock().up.iter().cloned().collect();
        up.shuffle(&mut rand::thread_rng());
        up
    }

    // Critical sections do no fallible arithmetic after the first set
    // update, so a poisoned lock still guards a consistent partition.
    fn lock(&self) -> MutexGuard<'_, PeerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Serializable view of one pool's partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    pub pool: String,
    pub up: Vec<PeerId>,
    pub down: Vec<DownPeer>,
}

impl PoolSnapshot {
    pub fn down_peers(&self) -> Vec<PeerId> {
        self.down.iter().map(|d| d.peer.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownPeer {
    pub peer: PeerId,
    pub retry_in_secs: u64,
}
