//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe backends
//! - Update backend liveness based on results

use std::sync::Arc;
use std::time::Duration;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::HealthCheckConfig;
use crate::load_balancer::backend::Backend;
use crate::load_balancer::pool::BackendPool;
use crate::observability::metrics;

/// Periodically probes every backend in a pool and records liveness.
///
/// Lifecycle is Stopped → Running → Stopped: [`start`](Self::start) drives the
/// probe loop until [`stop`](Self::stop) is called. Stopping only ends the
/// timer loop; probes already in flight still finish and write their result.
pub struct HealthMonitor {
    pool: Arc<BackendPool>,
    config: HealthCheckConfig,
    client: Client<HttpConnector, Body>,
    /// `Some` while running; firing it ends the loop.
    stop_tx: Mutex<Option<oneshot::Sender<()>>>,
}

impl HealthMonitor {
    pub fn new(pool: Arc<BackendPool>, config: HealthCheckConfig) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .build(HttpConnector::new());

        Self {
            pool,
            config,
            client,
            stop_tx: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.stop_tx.lock().is_some()
    }

    /// Run the probe loop: one round immediately, then one per interval,
    /// until [`stop`](Self::stop) is called.
    ///
    /// Returns at once if the monitor is already running.
    pub async fn start(&self) {
        if let Some(stop_rx) = self.register() {
            self.run(stop_rx).await;
        }
    }

    /// Mark the monitor running and drive the probe loop on a new task.
    ///
    /// The monitor counts as running as soon as this returns, so a
    /// [`stop`](Self::stop) issued before the task is first polled still ends
    /// it. Returns `None` if the monitor is already running.
    pub fn spawn(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let stop_rx = self.register()?;
        let monitor = self.clone();
        Some(tokio::spawn(async move { monitor.run(stop_rx).await }))
    }

    /// Transition Stopped → Running, handing out the stop receiver.
    fn register(&self) -> Option<oneshot::Receiver<()>> {
        let mut stop_tx = self.stop_tx.lock();
        if stop_tx.is_some() {
            tracing::warn!("Health monitor already running");
            return None;
        }
        let (tx, rx) = oneshot::channel();
        *stop_tx = Some(tx);
        Some(rx)
    }

    async fn run(&self, mut stop_rx: oneshot::Receiver<()>) {
        tracing::info!(
            interval_secs = self.config.interval_secs,
            timeout_secs = self.config.timeout_secs,
            path = %self.config.path,
            backends = self.pool.len(),
            "Health monitor started"
        );

        // The first tick completes immediately. A zero period would panic.
        let period = self.config.interval().max(Duration::from_millis(1));
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => break,
                _ = ticker.tick() => {
                    self.probe_round();
                }
            }
        }

        tracing::info!("Health monitor stopped");
    }

    /// End the probe loop. Does nothing if the monitor is not running.
    pub fn stop(&self) {
        match self.stop_tx.lock().take() {
            Some(tx) => {
                let _ = tx.send(());
            }
            None => tracing::debug!("Health monitor already stopped"),
        }
    }

    /// Spawn one probe per backend. The probes run independently; the
    /// returned handles may be awaited or dropped.
    pub fn probe_round(&self) -> Vec<JoinHandle<()>> {
        let timeout = self.config.timeout();

        self.pool
            .all_backends()
            .iter()
            .map(|backend| {
                let client = self.client.clone();
                let backend = backend.clone();
                let uri = backend.endpoint(&self.config.path);
                tokio::spawn(async move {
                    probe(&client, &backend, uri, timeout).await;
                })
            })
            .collect()
    }

    /// Probe every backend once and wait for all results.
    pub async fn check_now(&self) {
        join_all(self.probe_round()).await;
    }
}

/// Probe one backend and apply the outcome.
async fn probe(
    client: &Client<HttpConnector, Body>,
    backend: &Backend,
    uri: String,
    timeout: Duration,
) {
    let alive = check_backend(client, backend, uri, timeout).await;
    let was_alive = backend.is_alive();
    backend.set_alive(alive);

    if alive && !was_alive {
        tracing::info!(backend = %backend.address(), "Backend is now healthy");
        metrics::record_transition(backend.address(), true);
    } else if !alive && was_alive {
        tracing::warn!(backend = %backend.address(), "Backend marked down");
        metrics::record_transition(backend.address(), false);
    }

    metrics::record_backend_health(backend.address(), alive);
}

async fn check_backend(
    client: &Client<HttpConnector, Body>,
    backend: &Backend,
    uri: String,
    timeout: Duration,
) -> bool {
    let request = match Request::builder()
        .method("GET")
        .uri(uri)
        .header("user-agent", "http-balancer-health-check")
        .body(Body::empty())
    {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(backend = %backend.address(), error = %e, "Failed to build health check request");
            return false;
        }
    };

    match time::timeout(timeout, client.request(request)).await {
        Ok(Ok(response)) => {
            let status = response.status();
            if status != StatusCode::OK {
                tracing::warn!(backend = %backend.address(), status = %status, "Health check failed: unexpected status");
            }
            status == StatusCode::OK
        }
        Ok(Err(e)) => {
            tracing::warn!(backend = %backend.address(), error = %e, "Health check failed: connection error");
            false
        }
        Err(_) => {
            tracing::warn!(backend = %backend.address(), "Health check failed: timeout");
            false
        }
    }
}
