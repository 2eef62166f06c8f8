//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Dispatch requests to the request router
//! - Run the health monitor alongside the server

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, header},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::BalancerConfig;
use crate::health::HealthMonitor;
use crate::http::request::RequestIdGenerator;
use crate::http::status::render_status;
use crate::load_balancer::{BackendPool, BalancerError};
use crate::routing::RequestRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: RequestRouter,
}

/// HTTP front end of the load balancer.
pub struct HttpServer {
    router: Router,
    config: BalancerConfig,
    pool: Arc<BackendPool>,
    monitor: Arc<HealthMonitor>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: BalancerConfig) -> Result<Self, BalancerError> {
        let pool = Arc::new(BackendPool::from_config(&config.backends)?);
        let monitor = Arc::new(HealthMonitor::new(pool.clone(), config.health_check.clone()));

        let state = AppState {
            router: RequestRouter::new(pool.clone()),
        };

        let router = Self::build_router(&config, state);
        Ok(Self {
            router,
            config,
            pool,
            monitor,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &BalancerConfig, state: AppState) -> Router {
        Router::new()
            .route("/metrics", get(status_handler))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(RequestIdGenerator))
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires. The health monitor runs for the same span.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backends = self.pool.len(),
            "HTTP server starting"
        );

        let Self { router, monitor, .. } = self;

        // Registered before serving so an early shutdown still stops it.
        let health_task = monitor.spawn();

        let app = router.into_make_service_with_connect_info::<SocketAddr>();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        monitor.stop();
        if let Some(task) = health_task {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Health monitor task failed");
            }
        }

        served?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The application router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn pool(&self) -> &Arc<BackendPool> {
        &self.pool
    }

    pub fn monitor(&self) -> &Arc<HealthMonitor> {
        &self.monitor
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &BalancerConfig {
        &self.config
    }
}

/// Default handler: every request not matched elsewhere is load balanced.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    state.router.route(request, addr).await
}

/// Plain-text list of alive backends.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain")],
        render_status(&state.router.alive_backends()),
    )
}
