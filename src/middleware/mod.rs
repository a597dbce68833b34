pub mod auth;
pub mod csrf;
pub mod headers;
pub mod recover;

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::Request,
};
use tracing::{Span, info_span};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// trace_span_logger
///
/// Creates a span per request tagged with the `x-request-id` set by `SetRequestIdLayer`,
/// so every line logged while serving the request can be correlated.
pub fn trace_span_logger(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}

/// Logs one line per incoming request. The peer address is only known when the server
/// was started with connect info.
pub fn log_request(request: &Request<Body>, _span: &Span) {
    let ip = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_string());

    tracing::info!(
        ip = %ip,
        proto = ?request.version(),
        method = %request.method(),
        uri = %request.uri(),
        "received request"
    );
}
