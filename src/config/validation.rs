//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Backend URLs must be usable `http://` addresses, listed once
//! - Value ranges (interval and timeout > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::BalancerConfig;
use crate::load_balancer::backend::Backend;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("backend #{index}: {reason}")]
    InvalidBackend { index: usize, reason: String },

    #[error("backend '{url}' is listed more than once")]
    DuplicateBackend { url: String },

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("health check path '{path}' must start with '/'")]
    InvalidHealthPath { path: String },

    #[error("invalid bind address '{address}'")]
    InvalidBindAddress { address: String },
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut seen = HashSet::new();
    for (index, backend) in config.backends.iter().enumerate() {
        match Backend::parse(&backend.url) {
            Ok(parsed) => {
                if !seen.insert(parsed.address().to_string()) {
                    errors.push(ValidationError::DuplicateBackend {
                        url: backend.url.clone(),
                    });
                }
            }
            Err(e) => errors.push(ValidationError::InvalidBackend {
                index,
                reason: e.to_string(),
            }),
        }
    }

    if config.health_check.interval_secs == 0 {
        errors.push(ValidationError::ZeroDuration { field: "health_check.interval_secs" });
    }
    if config.health_check.timeout_secs == 0 {
        errors.push(ValidationError::ZeroDuration { field: "health_check.timeout_secs" });
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroDuration { field: "timeouts.request_secs" });
    }
    if !config.health_check.path.starts_with('/') {
        errors.push(ValidationError::InvalidHealthPath {
            path: config.health_check.path.clone(),
        });
    }
    if config.bind_address().parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress {
            address: config.bind_address(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
