//! Plain-text status page listing alive backends.

use std::fmt::Write;
use std::sync::Arc;

use crate::load_balancer::backend::Backend;

/// Render the `/metrics` status page.
pub fn render_status(alive: &[Arc<Backend>]) -> String {
    let mut out = String::from("Load Balancer Metrics\n====================\n\nAlive Backends:\n");
    for backend in alive {
        let _ = writeln!(out, "  - {}", backend.address());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_status() {
        let alive = vec![
            Arc::new(Backend::parse("http://localhost:9001").unwrap()),
            Arc::new(Backend::parse("http://localhost:9003").unwrap()),
        ];
        assert_eq!(
            render_status(&alive),
            "Load Balancer Metrics\n====================\n\nAlive Backends:\n  - http://localhost:9001\n  - http://localhost:9003\n"
        );
    }

    #[test]
    fn test_render_status_empty() {
        assert!(render_status(&[]).ends_with("Alive Backends:\n"));
    }
}
