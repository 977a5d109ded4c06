//! Client-side failover across a pool of interchangeable peers.
//!
//! A [`PeerRegistry`] tracks which peers of a pool are up and when each down
//! peer may be retried. A [`ConnectionSelector`] walks the registry's
//! candidate order, delegating each attempt to an injected [`Connector`] and
//! feeding the outcome back into the registry.

pub mod config;
pub mod failover;
pub mod health;
pub mod observability;

pub use config::FailoverConfig;
pub use failover::{ConnectError, ConnectionSelector, Connector, FailoverError, FailoverResult, PoolManager, TcpConnector};
pub use health::{PeerId, PeerRegistry, PoolSnapshot};
