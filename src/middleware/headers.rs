use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue, header},
    middleware::Next,
    response::Response,
};

pub const CONTENT_SECURITY_POLICY: &str =
    "default-src 'self'; style-src 'self'; font-src 'self'; img-src 'self' data:;";
pub const SERVER_NAME: &str = "ssnipp";

/// set_security_headers
///
/// Writes the fixed security headers, replacing any existing values for the same names.
pub fn set_security_headers(headers: &mut HeaderMap) {
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("origin-when-cross-origin"),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("deny"));
    headers.insert(header::X_XSS_PROTECTION, HeaderValue::from_static("0"));
    headers.insert(header::SERVER, HeaderValue::from_static(SERVER_NAME));
}

/// common_headers
///
/// Stamps the fixed security headers onto every response, error pages included.
/// Values set by a handler for the same names are overwritten. Responses built by
/// `recover_panic` for a contained panic never pass back through here, so it stamps
/// them itself.
pub async fn common_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    set_security_headers(response.headers_mut());
    response
}
