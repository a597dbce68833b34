use axum::{
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{RngCore, rngs::OsRng};
use subtle::ConstantTimeEq;

use crate::{config::AppConfig, error::AppError};

pub const CSRF_COOKIE: &str = "csrf_token";
/// Form field carrying the token in HTML forms.
pub const CSRF_FIELD: &str = "csrf_token";
/// Header alternative for non-form clients.
pub const CSRF_HEADER: &str = "x-csrf-token";

const TOKEN_BYTES: usize = 32;
const MAX_FORM_BYTES: usize = 2 * 1024 * 1024;
const COOKIE_MAX_AGE: time::Duration = time::Duration::days(365);

/// The request's CSRF token, exposed to handlers as a request extension so pages can embed
/// it in forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(pub String);

pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn is_safe_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Constant-time comparison; differing lengths never match.
pub fn tokens_match(submitted: &str, expected: &str) -> bool {
    submitted.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// csrf_guard
///
/// Double-submit cookie check. Every request gets a token (minted into the `csrf_token`
/// cookie when absent) and carries it downstream as a `CsrfToken` extension. Unsafe
/// methods must echo the cookie's token in the `csrf_token` form field or the
/// `X-CSRF-Token` header, otherwise they are answered 400 before anything below runs.
/// The body is buffered for the check and handed on unchanged.
pub async fn csrf_guard(
    State(config): State<AppConfig>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let existing = jar
        .get(CSRF_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .filter(|value| !value.is_empty());
    let minted = existing.is_none();
    let token = existing.unwrap_or_else(generate_token);

    let response = match verify(request, &token).await {
        Ok(mut request) => {
            request.extensions_mut().insert(CsrfToken(token.clone()));
            next.run(request).await
        }
        Err(err) => err.into_response(),
    };

    if minted {
        (jar.add(token_cookie(token, config.cookie_secure)), response).into_response()
    } else {
        response
    }
}

async fn verify(request: Request, expected: &str) -> Result<Request, AppError> {
    if is_safe_method(request.method()) {
        return Ok(request);
    }

    let (parts, body) = request.into_parts();
    let bytes = to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|_| AppError::Client(StatusCode::BAD_REQUEST))?;

    let submitted = parts
        .headers
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .or_else(|| {
            url::form_urlencoded::parse(&bytes)
                .find(|(key, _)| key == CSRF_FIELD)
                .map(|(_, value)| value.into_owned())
        });

    match submitted {
        Some(submitted) if tokens_match(&submitted, expected) => {
            Ok(Request::from_parts(parts, Body::from(bytes)))
        }
        _ => {
            tracing::warn!(method = %parts.method, uri = %parts.uri, "csrf token mismatch");
            Err(AppError::Client(StatusCode::BAD_REQUEST))
        }
    }
}

fn token_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(COOKIE_MAX_AGE)
        .build()
}
