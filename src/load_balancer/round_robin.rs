//! Round-robin load balancing strategy.

use parking_lot::Mutex;
use std::sync::Arc;
use crate::load_balancer::{LoadBalancer, backend::Backend};

/// Round-robin selector.
///
/// Keeps a rotation cursor into the pool. A selection scans forward from the
/// cursor for the first alive backend, advancing the cursor once per examined
/// position. The scan and every advance happen under one lock, so concurrent
/// callers see a serialized rotation.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: Mutex<usize>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cursor position.
    pub fn position(&self) -> usize {
        *self.cursor.lock()
    }
}

impl LoadBalancer for RoundRobin {
    fn next_server(&self, backends: &[Arc<Backend>]) -> Option<Arc<Backend>> {
        if backends.is_empty() {
            return None;
        }

        let len = backends.len();
        let mut cursor = self.cursor.lock();

        for _ in 0..len {
            let index = *cursor % len;
            *cursor = (index + 1) % len;

            let backend = &backends[index];
            if backend.is_alive() {
                return Some(backend.clone());
            }
        }

        // Nothing alive: serve from the first backend rather than fail the request.
        tracing::debug!(
            backend = %backends[0].address(),
            pool_size = len,
            "No alive backends, failing over to first backend"
        );
        Some(backends[0].clone())
    }
}
