//! Failover subsystem.
//!
//! # Data Flow
//! ```text
//! caller → selector.rs (connect)
//!     → health::PeerRegistry::candidate_order()
//!     → connector.rs (one attempt per candidate, outside any lock)
//!         - success: mark_up, return connection
//!         - connection failure: mark_down, next candidate
//!         - fatal error: surface immediately
//!     → sequence exhausted: NoPeersAvailable
//! ```
//!
//! # Design Decisions
//! - Registries are shared per pool through pool.rs, never global statics
//! - No deadline across the whole sequence; connectors bound each attempt
//! - Every call opens a fresh connection; nothing is pooled or reused

pub mod connector;
pub mod pool;
pub mod selector;
pub mod types;

pub use connector::{Connector, TcpConnector};
pub use pool::PoolManager;
pub use selector::ConnectionSelector;
pub use types::{ConnectError, FailoverError, FailoverResult};
