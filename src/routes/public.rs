use crate::{AppState, handlers};
use axum::{Router, routing::get};
use tower_sessions::SessionStore;

/// Public Router Module
///
/// Pages open to anonymous visitors. They still run behind the dynamic chain, so every
/// response carries a session and a CSRF token and the nav knows whether the visitor is
/// logged in.
pub fn public_routes<Store>(state: &AppState, store: Store) -> Router<AppState>
where
    Store: SessionStore + Clone,
{
    let mut router = Router::new()
        // GET /view/{id}
        // Anyone with the link can read a snippet.
        .route("/view/{id}", get(handlers::snippet_view))
        // GET|POST /login
        .route(
            "/login",
            get(handlers::user_login).post(handlers::user_login_post),
        );

    // Signup is left unregistered when disabled, so both methods answer 404.
    if state.config.allow_signup {
        router = router.route(
            "/signup",
            get(handlers::user_signup).post(handlers::user_signup_post),
        );
    }

    super::dynamic(router, state, store)
}
