use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::SessionStore;

/// Authenticated Router Module
///
/// Routes behind the access guard. Anonymous requests never reach these handlers: the
/// guard records the path and redirects to `/login`.
pub fn authenticated_routes<Store>(state: &AppState, store: Store) -> Router<AppState>
where
    Store: SessionStore + Clone,
{
    let router = Router::new()
        // GET /
        // Home page with the new snippet form.
        .route("/", get(handlers::home))
        // POST /create
        .route("/create", post(handlers::snippet_create_post))
        // POST /logout
        .route("/logout", post(handlers::user_logout_post));

    super::protected(router, state, store)
}
