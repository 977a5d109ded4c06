//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::health::peer::PeerId;

/// Seconds a failed peer stays down before it is retried.
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 30;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FailoverConfig {
    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Peer pools keyed by pool name.
    pub pools: BTreeMap<String, PoolConfig>,
}

/// One pool of interchangeable peers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PoolConfig {
    /// Peers in this pool. Fixed for the life of the process.
    pub peers: Vec<PeerConfig>,

    /// Seconds a failed peer stays down before being retried.
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Per-attempt connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl PoolConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn peer_ids(&self) -> Vec<PeerId> {
        self.peers.iter().map(|p| PeerId::from(p.name.as_str())).collect()
    }
}

/// A single peer endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PeerConfig {
    /// Unique peer identifier within its pool.
    pub name: String,

    /// Peer address (e.g., "10.0.0.1:6033").
    pub address: String,
}

fn default_check_interval() -> u64 {
    DEFAULT_CHECK_INTERVAL_SECS
}

fn default_connect_timeout() -> u64 {
    5
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
