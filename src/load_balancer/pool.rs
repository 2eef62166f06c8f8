//! Backend pool management.
//!
//! # Responsibilities
//! - Own the ordered, fixed set of backends for one balancer instance
//! - Apply the load balancing algorithm to select backends
//! - Provide liveness snapshots for status reporting

use std::sync::Arc;
use crate::config::BackendConfig;
use crate::load_balancer::{
    BalancerError,
    LoadBalancer,
    backend::Backend,
    round_robin::RoundRobin,
};

/// The ordered pool of backends plus the selector that rotates through it.
///
/// Membership and order are fixed at construction. The pool is shared through
/// an `Arc` by the request path and the health monitor.
#[derive(Debug)]
pub struct BackendPool {
    backends: Vec<Arc<Backend>>,
    balancer: Box<dyn LoadBalancer>,
}

impl BackendPool {
    /// Create a round-robin pool over `backends`, in the given order.
    pub fn new(backends: Vec<Arc<Backend>>) -> Self {
        Self::with_balancer(backends, Box::new(RoundRobin::new()))
    }

    pub fn with_balancer(backends: Vec<Arc<Backend>>, balancer: Box<dyn LoadBalancer>) -> Self {
        Self { backends, balancer }
    }

    /// Build a pool from configuration, preserving the configured order.
    pub fn from_config(configs: &[BackendConfig]) -> Result<Self, BalancerError> {
        let backends = configs
            .iter()
            .map(|config| Backend::parse(&config.url).map(Arc::new))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(backends))
    }

    /// Choose the backend for the next request.
    pub fn select_next(&self) -> Result<Arc<Backend>, BalancerError> {
        self.balancer
            .next_server(&self.backends)
            .ok_or(BalancerError::NoBackends)
    }

    /// Backends currently believed alive, in pool order.
    pub fn alive_backends(&self) -> Vec<Arc<Backend>> {
        self.backends
            .iter()
            .filter(|b| b.is_alive())
            .cloned()
            .collect()
    }

    /// Every backend, in pool order.
    pub fn all_backends(&self) -> &[Arc<Backend>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(urls: &[&str]) -> Vec<BackendConfig> {
        urls.iter().map(|u| BackendConfig { url: u.to_string() }).collect()
    }

    #[test]
    fn test_empty_pool_has_no_backends() {
        let pool = BackendPool::new(Vec::new());
        for _ in 0..3 {
            assert!(matches!(pool.select_next(), Err(BalancerError::NoBackends)));
        }
    }

    #[test]
    fn test_from_config_preserves_order() {
        let pool = BackendPool::from_config(&config(&[
            "http://localhost:9003",
            "http://localhost:9001",
            "http://localhost:9002",
        ]))
        .unwrap();

        let addrs: Vec<_> = pool.all_backends().iter().map(|b| b.address().to_string()).collect();
        assert_eq!(addrs, ["http://localhost:9003", "http://localhost:9001", "http://localhost:9002"]);
        assert_eq!(pool.select_next().unwrap().address(), "http://localhost:9003");
    }

    #[test]
    fn test_from_config_rejects_invalid_url() {
        let err = BackendPool::from_config(&config(&["http://localhost:9001", "::nope::"])).unwrap_err();
        assert!(matches!(err, BalancerError::InvalidBackendUrl { .. }));
    }

    #[test]
    fn test_alive_snapshot_in_pool_order() {
        let pool = BackendPool::from_config(&config(&[
            "http://localhost:9001",
            "http://localhost:9002",
            "http://localhost:9003",
        ]))
        .unwrap();
        pool.all_backends()[1].set_alive(false);

        let alive: Vec<_> = pool.alive_backends().iter().map(|b| b.address().to_string()).collect();
        assert_eq!(alive, ["http://localhost:9001", "http://localhost:9003"]);
        assert_eq!(pool.len(), 3);
    }

    #[test]
    fn test_all_dead_fails_over_to_first() {
        let pool = BackendPool::from_config(&config(&["http://localhost:9001", "http://localhost:9002"])).unwrap();
        for b in pool.all_backends() {
            b.set_alive(false);
        }
        for _ in 0..4 {
            assert_eq!(pool.select_next().unwrap().address(), "http://localhost:9001");
        }
    }
}
