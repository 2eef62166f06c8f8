//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → pool.rs (ordered backends for this balancer)
//!     → round_robin.rs (rotate through backends, skipping dead ones)
//!     → backend.rs (connection guard held for the exchange)
//!     → Return backend or NoBackends
//! ```
//!
//! # Design Decisions
//! - The pool is fixed at startup; no dynamic membership
//! - Liveness is written by the health monitor, only read here
//! - When every backend is dead the first one is returned anyway
//! - Algorithms sit behind `LoadBalancer` so others can be plugged in

pub mod backend;
pub mod pool;
pub mod round_robin;

use std::sync::Arc;
use thiserror::Error;

use self::backend::Backend;

pub use self::backend::BackendConnectionGuard;
pub use self::pool::BackendPool;
pub use self::round_robin::RoundRobin;

/// A backend selection algorithm.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick the backend for the next request, or `None` if there are no backends.
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>>;
}

/// Errors raised by the balancing layer.
#[derive(Debug, Error)]
pub enum BalancerError {
    /// The pool is empty.
    #[error("no backends available")]
    NoBackends,

    #[error("invalid backend url '{address}': {reason}")]
    InvalidBackendUrl { address: String, reason: String },
}
