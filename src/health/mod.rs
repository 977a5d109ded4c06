//! Peer health subsystem.
//!
//! # Data Flow
//! ```text
//! Connection attempt outcome
//!     → state.rs (mark_up / mark_down under the state lock)
//!
//! Next connection attempt
//!     → candidates.rs (retry-eligible down peers, then shuffled up peers)
//! ```
//!
//! # Design Decisions
//! - Health is classified from real connection attempts, never from health checks
//! - One registry per pool, shared by `Arc` between all callers
//! - Only one caller at a time retries down peers; others never wait

pub mod candidates;
pub mod peer;
pub mod state;

pub use candidates::CandidateOrder;
pub use peer::PeerId;
pub use state::{DownPeer, PeerRegistry, PoolSnapshot, MAX_CHECK_INTERVAL};
