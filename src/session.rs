use tower_sessions::{Expiry, SessionManagerLayer, SessionStore, cookie::SameSite};

/// Session keys. Values: `String`, `i64` and `String` respectively.
pub const FLASH: &str = "flash";
pub const AUTHENTICATED_USER_ID: &str = "authenticatedUserID";
pub const REDIRECT_PATH_AFTER_LOGIN: &str = "redirectPathAfterLogin";

pub const SESSION_COOKIE: &str = "session";

/// Sessions die after this long without a request.
pub const SESSION_LIFETIME: time::Duration = time::Duration::hours(12);

/// session_layer
///
/// Loads the session named by the `session` cookie before the inner service runs and
/// writes it back to `store` afterwards, but only when the handler changed it. A
/// `cycle_id` during the request deletes the old record and issues a fresh cookie.
pub fn session_layer<Store>(store: Store, secure: bool) -> SessionManagerLayer<Store>
where
    Store: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_path("/")
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(secure)
        .with_expiry(Expiry::OnInactivity(SESSION_LIFETIME))
}
