//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request IDs
//! - Rewrite the request URI onto the chosen backend
//! - Add forwarding headers (X-Forwarded-For, X-Forwarded-Host, X-Real-IP)
//! - Strip hop-by-hop headers before forwarding
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body is passed through untouched; nothing is buffered

use axum::body::Body;
use axum::http::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Request, Uri, Version,
};
use std::net::SocketAddr;
use tower_http::request_id::{MakeRequestId, RequestId};
use url::Url;
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";
pub const X_FORWARDED_HOST: &str = "x-forwarded-host";
pub const X_REAL_IP: &str = "x-real-ip";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdGenerator;

impl MakeRequestId for RequestIdGenerator {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Headers that describe a single connection and must not be forwarded.
///
/// `Upgrade` is included; protocol upgrades are not proxied.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in &named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Rewrite a client request so it can be sent to `target`.
///
/// The target's path is joined in front of the request path and query strings
/// are combined. Method, remaining headers and body are kept as they are.
pub fn prepare_forward(
    request: Request<Body>,
    target: &Url,
    client_addr: SocketAddr,
) -> Result<Request<Body>, axum::http::Error> {
    let (mut parts, body) = request.into_parts();

    let original_host = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(|a| a.to_string()));

    parts.uri = target_uri(target, &parts.uri)?;
    parts.version = Version::HTTP_11;

    strip_hop_by_hop(&mut parts.headers);

    let client_ip = client_addr.ip().to_string();
    let forwarded_for = match parts.headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
        Some(prior) if !prior.trim().is_empty() => format!("{}, {}", prior, client_ip),
        _ => client_ip.clone(),
    };
    parts.headers.insert(X_FORWARDED_FOR, HeaderValue::from_str(&forwarded_for)?);
    parts.headers.insert(X_REAL_IP, HeaderValue::from_str(&client_ip)?);
    if let Some(host) = original_host {
        parts.headers.insert(X_FORWARDED_HOST, HeaderValue::from_str(&host)?);
    }

    Ok(Request::from_parts(parts, body))
}

/// Build the backend URI for an incoming request URI.
fn target_uri(target: &Url, incoming: &Uri) -> Result<Uri, axum::http::Error> {
    let path = join_paths(target.path(), incoming.path());

    let query = match (target.query().filter(|q| !q.is_empty()), incoming.query().filter(|q| !q.is_empty())) {
        (Some(t), Some(r)) => Some(format!("{}&{}", t, r)),
        (Some(t), None) => Some(t.to_string()),
        (None, Some(r)) => Some(r.to_string()),
        (None, None) => None,
    };

    let path_and_query = match query {
        Some(q) => format!("{}?{}", path, q),
        None => path,
    };

    let authority = match target.port() {
        Some(port) => format!("{}:{}", target.host_str().unwrap_or_default(), port),
        None => target.host_str().unwrap_or_default().to_string(),
    };

    Uri::builder()
        .scheme(target.scheme())
        .authority(authority)
        .path_and_query(path_and_query)
        .build()
}

/// Join two paths with exactly one slash between them.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}
