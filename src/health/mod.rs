//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each backend concurrently (GET <backend>/health)
//!     → 200 marks alive, anything else marks down
//! ```
//!
//! # Design Decisions
//! - One attempt per backend per round; a missed probe is fixed next round
//! - Health state is per-backend, not per-pool
//! - Probe failures never reach the request path

pub mod active;

pub use active::HealthMonitor;
