//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server
//! - Track active connections
//! - Track liveness as reported by the health monitor

use parking_lot::RwLock;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use url::Url;

use crate::load_balancer::BalancerError;

/// Liveness flag plus the moment it was last determined.
#[derive(Debug, Clone, Copy)]
struct Liveness {
    alive: bool,
    last_checked: SystemTime,
}

/// A single backend server.
#[derive(Debug)]
pub struct Backend {
    /// Address as configured, without a trailing slash.
    address: String,
    /// Parsed base URL used when forwarding.
    url: Url,
    /// Number of currently active connections.
    active_connections: AtomicUsize,
    liveness: RwLock<Liveness>,
}

impl Backend {
    /// Create a new backend. Backends start out alive until a probe says otherwise.
    pub fn new(url: Url) -> Self {
        let address = url.as_str().trim_end_matches('/').to_string();
        Self {
            address,
            url,
            active_connections: AtomicUsize::new(0),
            liveness: RwLock::new(Liveness {
                alive: true,
                last_checked: SystemTime::now(),
            }),
        }
    }

    /// Parse a backend from its configured address (e.g. `http://localhost:9001`).
    pub fn parse(address: &str) -> Result<Self, BalancerError> {
        let url = Url::parse(address).map_err(|e| BalancerError::InvalidBackendUrl {
            address: address.to_string(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "http" {
            return Err(BalancerError::InvalidBackendUrl {
                address: address.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        if url.host_str().is_none() {
            return Err(BalancerError::InvalidBackendUrl {
                address: address.to_string(),
                reason: "missing host".to_string(),
            });
        }

        Ok(Self::new(url))
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Full URL of `path` on this backend, e.g. the health endpoint.
    ///
    /// `path` is appended to the base path; any query or fragment on the
    /// configured URL is dropped.
    pub fn endpoint(&self, path: &str) -> String {
        let mut url = self.url.clone();
        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url.set_query(None);
        url.set_fragment(None);
        url.to_string()
    }

    // --- Liveness ---

    /// Record the outcome of a liveness determination.
    pub fn set_alive(&self, alive: bool) {
        let mut liveness = self.liveness.write();
        liveness.alive = alive;
        liveness.last_checked = SystemTime::now();
    }

    pub fn is_alive(&self) -> bool {
        self.liveness.read().alive
    }

    /// When liveness was last determined.
    pub fn last_checked(&self) -> SystemTime {
        self.liveness.read().last_checked
    }

    // --- Connections ---

    /// Get the current number of active connections.
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::Acquire)
    }

    /// Increment active connection count.
    pub fn inc_connections(&self) {
        self.active_connections.fetch_add(1, Ordering::AcqRel);
    }

    /// Decrement active connection count. Never goes below zero.
    pub fn dec_connections(&self) {
        let _ = self
            .active_connections
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    /// Count a connection against this backend for as long as the guard lives.
    pub fn connection_guard(self: &Arc<Self>) -> BackendConnectionGuard {
        self.inc_connections();
        BackendConnectionGuard {
            backend: self.clone(),
        }
    }
}

/// A RAII guard that manages the active connection count.
///
/// The count is released on drop, which also covers unwinding.
#[derive(Debug)]
pub struct BackendConnectionGuard {
    backend: Arc<Backend>,
}

impl BackendConnectionGuard {
    pub fn backend(&self) -> &Arc<Backend> {
        &self.backend
    }
}

impl Deref for BackendConnectionGuard {
    type Target = Backend;
    fn deref(&self) -> &Self::Target {
        &self.backend
    }
}

impl Drop for BackendConnectionGuard {
    fn drop(&mut self) {
        self.backend.dec_connections();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn backend(addr: &str) -> Arc<Backend> {
        Arc::new(Backend::parse(addr).unwrap())
    }

    #[test]
    fn test_new_backend_is_alive() {
        let b = backend("http://localhost:9001");
        assert!(b.is_alive());
        assert_eq!(b.active_connections(), 0);
        assert_eq!(b.address(), "http://localhost:9001");
    }

    #[test]
    fn test_parse_rejects_bad_urls() {
        assert!(Backend::parse("not a url").is_err());
        assert!(Backend::parse("https://localhost:9001").is_err());
        assert!(Backend::parse("http://").is_err());
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        assert_eq!(backend("http://localhost:9001/").endpoint("/health"), "http://localhost:9001/health");
        assert_eq!(backend("http://10.0.0.1:80/api").endpoint("/health"), "http://10.0.0.1/api/health");
    }

    #[test]
    fn test_endpoint_drops_base_query() {
        assert_eq!(backend("http://h/api?k=v").endpoint("/health"), "http://h/api/health");
        assert_eq!(backend("http://h:9001/?k=v#top").endpoint("/health"), "http://h:9001/health");
    }

    #[test]
    fn test_set_alive_stamps_last_checked() {
        let b = backend("http://localhost:9001");
        let before = b.last_checked();
        std::thread::sleep(Duration::from_millis(5));

        b.set_alive(false);
        assert!(!b.is_alive());
        assert!(b.last_checked() > before);

        b.set_alive(true);
        assert!(b.is_alive());
    }

    #[test]
    fn test_decrement_never_negative() {
        let b = backend("http://localhost:9001");
        b.dec_connections();
        assert_eq!(b.active_connections(), 0);

        b.inc_connections();
        b.dec_connections();
        b.dec_connections();
        assert_eq!(b.active_connections(), 0);
    }

    #[test]
    fn test_balanced_increments_return_to_zero() {
        let b = backend("http://localhost:9001");
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let b = b.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        b.inc_connections();
                    }
                    for _ in 0..1000 {
                        b.dec_connections();
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }
        assert_eq!(b.active_connections(), 0);
    }

    #[test]
    fn test_guard_releases_on_drop_and_panic() {
        let b = backend("http://localhost:9001");
        {
            let _g1 = b.connection_guard();
            let _g2 = b.connection_guard();
            assert_eq!(b.active_connections(), 2);
        }
        assert_eq!(b.active_connections(), 0);

        let cloned = b.clone();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = cloned.connection_guard();
            panic!("forwarding blew up");
        }));
        assert!(result.is_err());
        assert_eq!(b.active_connections(), 0);
    }
}
