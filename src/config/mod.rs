//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FailoverConfig (validated, immutable)
//!     → failover::PoolManager builds one registry per pool
//! ```
//!
//! # Design Decisions
//! - Peer lists are fixed once loaded; there is no hot reload
//! - Intervals and timeouts have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{FailoverConfig, ObservabilityConfig, PeerConfig, PoolConfig, DEFAULT_CHECK_INTERVAL_SECS};
pub use validation::ValidationError;
