//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Registry and selector produce:
//!     → logging.rs (structured tracing events per state transition)
//!     → metrics.rs (transition counters, up-peer gauge, exhaustion counter)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Every event carries the pool name and, where relevant, the peer
//! - Metrics are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
