//! Request routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (any path except /metrics)
//!     → router.rs
//!         → pool.select_next()
//!             NoBackends → 503, stop
//!         → connection guard taken on the backend
//!         → request rewritten onto the backend, forwarded
//!             transport error → 502
//!         → response streamed back, guard released at body end
//! ```
//!
//! # Design Decisions
//! - No retries; a failed forward is reported, not re-sent elsewhere
//! - A dead failover backend is counted like any other

pub mod router;

pub use router::{ProxyError, RequestRouter};
