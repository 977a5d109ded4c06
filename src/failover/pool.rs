//! Pool management.
//!
//! # Responsibilities
//! - Own one `PeerRegistry` per named pool for the life of the process
//! - Hand the same registry to every caller that names the same pool
//! - Build every configured pool at startup

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::FailoverConfig;
use crate::failover::types::FailoverResult;
use crate::health::peer::PeerId;
use crate::health::state::{PeerRegistry, PoolSnapshot};

/// Process-wide map of pool name -> shared registry.
#[derive(Debug, Default)]
pub struct PoolManager {
    pools: DashMap<String, Arc<PeerRegistry>>,
}

impl PoolManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a manager with every pool from configuration initialized.
    pub fn from_config(config: &FailoverConfig) -> FailoverResult<Self> {
        let manager = Self::new();
        for (name, pool) in &config.pools {
            manager.registry(name, pool.peer_ids(), pool.check_interval())?;
        }
        Ok(manager)
    }

    /// Return the registry for `name`, creating and initializing it on first use.
    ///
    /// Later calls for the same pool get the existing registry back; their
    /// peers and interval are ignored.
    pub fn registry<I>(&self, name: &str, peers: I, check_interval: Duration) -> FailoverResult<Arc<PeerRegistry>>
    where
        I: IntoIterator,
        I::Item: Into<PeerId>,
    {
        let registry = self
            .pools
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(PeerRegistry::new(name)))
            .clone();
        registry.initialize(peers, check_interval)?;
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<Arc<PeerRegistry>> {
        self.pools.get(name).map(|entry| entry.value().clone())
    }

    /// Sorted pool names.
    pub fn pool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pools.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    /// Reset every pool, returning all peers to the up set.
    pub fn reset_all(&self) {
        for entry in self.pools.iter() {
            entry.value().reset();
        }
    }

    pub fn snapshots(&self) -> Vec<PoolSnapshot> {
        self.pool_names()
            .iter()
            .filter_map(|name| self.get(name))
            .map(|registry| registry.snapshot())
            .collect()
    }
}
