//! Round-robin HTTP load balancer library.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod routing;

pub use config::BalancerConfig;
pub use health::HealthMonitor;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load_balancer::{BackendPool, BalancerError};
pub use routing::RequestRouter;
