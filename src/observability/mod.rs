//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape (optional)
//!     → GET /metrics plain-text status on the balancer port
//! ```
//!
//! # Design Decisions
//! - Structured logging with key/value fields
//! - Request ID flows from the client edge to the backend
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
