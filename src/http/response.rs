//! Response handling and transformation.
//!
//! # Responsibilities
//! - Hand the backend response back to the client
//! - Remove hop-by-hop headers
//! - Keep the backend's connection counted until the body has been streamed
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Status and end-to-end headers pass through unchanged

use axum::body::Body;
use axum::http::Response;
use futures_util::StreamExt;

use crate::http::request::strip_hop_by_hop;
use crate::load_balancer::BackendConnectionGuard;

/// Convert a backend response into the client response.
///
/// `guard` is moved into the body stream so the connection stays counted
/// until the body is finished or the client goes away.
pub fn from_upstream<B>(response: Response<B>, guard: BackendConnectionGuard) -> Response<Body>
where
    B: axum::body::HttpBody<Data = axum::body::Bytes> + Send + 'static,
    B::Error: Into<axum::BoxError>,
{
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);

    let stream = Body::new(body).into_data_stream().map(move |chunk| {
        let _held = &guard;
        chunk
    });

    Response::from_parts(parts, Body::from_stream(stream))
}
