//! Toy backend for exercising the balancer locally.
//!
//! Answers `/` with a greeting naming its port and `/health` with `OK`.

use axum::{http::header, routing::get, Router};
use clap::Parser;
use std::net::SocketAddr;

#[derive(Parser)]
#[command(name = "demo-backend")]
#[command(about = "Minimal HTTP backend with a /health endpoint", long_about = None)]
struct Cli {
    /// Port to listen on
    #[arg(long, default_value_t = 9001, value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,
}

fn app(port: u16) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async { "OK" }),
        )
        .fallback(move || async move {
            (
                [(header::CONTENT_TYPE, "text/plain")],
                format!("Hello from server {}\n", port),
            )
        })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(port = cli.port, "Backend server starting");
    axum::serve(listener, app(cli.port)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn get(port: u16, path: &str) -> (StatusCode, String) {
        let response = app(port)
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(get(9002, "/health").await, (StatusCode::OK, "OK".to_string()));
    }

    #[tokio::test]
    async fn test_greeting_names_port() {
        assert_eq!(get(9002, "/").await, (StatusCode::OK, "Hello from server 9002\n".to_string()));
        assert_eq!(get(9002, "/any/path").await.1, "Hello from server 9002\n");
    }
}
