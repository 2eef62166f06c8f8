//! Request router: the per-request entry point of the balancer.
//!
//! # Responsibilities
//! - Ask the pool for a backend
//! - Forward the request and stream the response back
//! - Keep the backend's connection count accurate on every exit path
//! - Report selection failure as 503 and transport failure as 502

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::http::request::{prepare_forward, X_REQUEST_ID};
use crate::http::response::from_upstream;
use crate::load_balancer::{backend::Backend, BackendPool, BalancerError};
use crate::observability::metrics;

/// Failures surfaced to the client by the router.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Balancer(#[from] BalancerError),

    /// The outbound request could not be built.
    #[error("failed to build request for '{backend}': {source}")]
    Request {
        backend: String,
        #[source]
        source: axum::http::Error,
    },

    /// The backend could not be reached or dropped the exchange.
    #[error("upstream '{backend}' failed: {source}")]
    Upstream {
        backend: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },
}

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ProxyError::Balancer(_) => StatusCode::SERVICE_UNAVAILABLE,
            ProxyError::Request { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ProxyError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match self {
            ProxyError::Balancer(_) => "No backend servers available",
            ProxyError::Request { .. } => "Internal server error",
            ProxyError::Upstream { .. } => "Bad gateway",
        };
        (self.status_code(), body).into_response()
    }
}

/// Routes each request to the next backend in the pool.
#[derive(Clone)]
pub struct RequestRouter {
    pool: Arc<BackendPool>,
    client: Client<HttpConnector, Body>,
}

impl RequestRouter {
    pub fn new(pool: Arc<BackendPool>) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .build(HttpConnector::new());
        Self { pool, client }
    }

    pub fn pool(&self) -> &Arc<BackendPool> {
        &self.pool
    }

    /// Backends currently believed alive, for status reporting.
    pub fn alive_backends(&self) -> Vec<Arc<Backend>> {
        self.pool.alive_backends()
    }

    /// Handle one client request.
    pub async fn route(&self, request: Request<Body>, client_addr: SocketAddr) -> Response {
        let start = Instant::now();
        let request_id = request
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        match self.forward(request, client_addr, start).await {
            Ok(response) => response,
            Err(e) => {
                match &e {
                    ProxyError::Balancer(_) => {
                        tracing::warn!(request_id = %request_id, "No backend servers available");
                        metrics::record_no_backend();
                    }
                    ProxyError::Request { backend, .. } | ProxyError::Upstream { backend, .. } => {
                        tracing::error!(request_id = %request_id, error = %e, "Proxy error");
                        metrics::record_request(backend, e.status_code().as_u16(), start);
                    }
                }
                e.into_response()
            }
        }
    }

    async fn forward(
        &self,
        request: Request<Body>,
        client_addr: SocketAddr,
        start: Instant,
    ) -> Result<Response, ProxyError> {
        let backend = self.pool.select_next()?;

        // Counted from here until the response body is done, on every path.
        let guard = backend.connection_guard();

        tracing::debug!(
            backend = %guard.address(),
            method = %request.method(),
            path = %request.uri().path(),
            active_connections = guard.active_connections(),
            "Routing request"
        );

        let outbound = prepare_forward(request, guard.url(), client_addr).map_err(|source| {
            ProxyError::Request {
                backend: guard.address().to_string(),
                source,
            }
        })?;

        let response = self
            .client
            .request(outbound)
            .await
            .map_err(|source| ProxyError::Upstream {
                backend: guard.address().to_string(),
                source,
            })?;

        metrics::record_request(guard.address(), response.status().as_u16(), start);
        Ok(from_upstream(response, guard))
    }
}
