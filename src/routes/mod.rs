/// Router Module Index
///
/// Routes are grouped by the middleware chain they run behind. Both groups sit inside the
/// standard chain applied by `create_router`:
///
/// - `public`: the dynamic chain (session, CSRF, authentication resolver).
/// - `authenticated`: the dynamic chain plus the access guard.
pub mod authenticated;
pub mod public;

use axum::{Router, middleware};
use tower::ServiceBuilder;
use tower_sessions::SessionStore;

use crate::{
    AppState,
    middleware::{auth, csrf},
    session::session_layer,
};

/// dynamic
///
/// Wraps every route of `router` in session load/save, then CSRF verification, then the
/// authentication resolver, in that order from the outside in.
pub fn dynamic<Store>(router: Router<AppState>, state: &AppState, store: Store) -> Router<AppState>
where
    Store: SessionStore + Clone,
{
    router.route_layer(
        ServiceBuilder::new()
            .layer(session_layer(store, state.config.cookie_secure))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                csrf::csrf_guard,
            ))
            .layer(middleware::from_fn_with_state(
                state.clone(),
                auth::authenticate,
            )),
    )
}

/// protected
///
/// The dynamic chain with the access guard appended innermost.
pub fn protected<Store>(router: Router<AppState>, state: &AppState, store: Store) -> Router<AppState>
where
    Store: SessionStore + Clone,
{
    dynamic(
        router.route_layer(middleware::from_fn(auth::require_authentication)),
        state,
        store,
    )
}
