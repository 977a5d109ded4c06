//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals and timeouts > 0, intervals bounded)
//! - Detect duplicate peers and malformed addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FailoverConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use thiserror::Error;

use crate::config::schema::{FailoverConfig, PoolConfig};
use crate::health::state::MAX_CHECK_INTERVAL;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no pools configured")]
    NoPools,

    #[error("pool '{0}' has no peers")]
    EmptyPool(String),

    #[error("pool '{0}' check_interval_secs must be positive")]
    ZeroCheckInterval(String),

    #[error("pool '{pool}' check_interval_secs must not exceed {max}")]
    CheckIntervalTooLong { pool: String, max: u64 },

    #[error("pool '{0}' connect_timeout_secs must be positive")]
    ZeroConnectTimeout(String),

    #[error("pool '{pool}' lists peer '{peer}' more than once")]
    DuplicatePeer { pool: String, peer: String },

    #[error("pool '{pool}' peer '{peer}' has invalid address '{address}'")]
    InvalidAddress {
        pool: String,
        peer: String,
        address: String,
    },
}

pub fn validate_config(config: &FailoverConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.pools.is_empty() {
        errors.push(ValidationError::NoPools);
    }
    for (name, pool) in &config.pools {
        validate_pool(name, pool, &mut errors);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_pool(name: &str, pool: &PoolConfig, errors: &mut Vec<ValidationError>) {
    if pool.peers.is_empty() {
        errors.push(ValidationError::EmptyPool(name.to_string()));
    }
    if pool.check_interval_secs == 0 {
        errors.push(ValidationError::ZeroCheckInterval(name.to_string()));
    }
    if pool.check_interval_secs > MAX_CHECK_INTERVAL.as_secs() {
        errors.push(ValidationError::CheckIntervalTooLong {
            pool: name.to_string(),
            max: MAX_CHECK_INTERVAL.as_secs(),
        });
    }
    if pool.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroConnectTimeout(name.to_string()));
    }

    let mut seen = HashSet::new();
    for peer in &pool.peers {
        if !seen.insert(peer.name.as_str()) {
            errors.push(ValidationError::DuplicatePeer {
                pool: name.to_string(),
                peer: peer.name.clone(),
            });
        }
        if !is_host_port(&peer.address) {
            errors.push(ValidationError::InvalidAddress {
                pool: name.to_string(),
                peer: peer.name.clone(),
                address: peer.address.clone(),
            });
        }
    }
}

/// `host:port` with a non-empty host and a valid port. Hostnames are resolved
/// at connect time, so only the shape is checked here.
fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}
