//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, URI rewrite, forwarding headers)
//!     → [routing::RequestRouter picks a backend and forwards]
//!     → response.rs (strip hop-by-hop headers, stream body)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod status;

pub use request::{RequestIdGenerator, X_REQUEST_ID};
pub use server::HttpServer;
