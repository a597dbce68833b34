use axum::{Router, extract::FromRef, http::HeaderName, middleware::from_fn, routing::get};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    trace::{DefaultOnResponse, TraceLayer},
};
use tower_sessions::SessionStore;
use tracing::Level;

// --- Module Structure ---

pub mod config;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod languages;
pub mod middleware;
pub mod mocks;
pub mod models;
pub mod repository;
pub mod session;
pub mod templates;
pub mod validator;

// Routes grouped by middleware chain (public = dynamic, authenticated = protected).
pub mod routes;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{PostgresRepository, SnippetState, UserState};

use crate::middleware::{
    REQUEST_ID_HEADER, headers::common_headers, log_request, recover, trace_span_logger,
};

/// Directory served under `/static`, relative to the working directory.
pub const STATIC_DIR: &str = "ui/static";

/// AppState
///
/// Shared, immutable application state: the two repositories and the loaded configuration.
/// Handlers pull out only the parts they need through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    pub snippets: SnippetState,
    pub users: UserState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for SnippetState {
    fn from_ref(app_state: &AppState) -> SnippetState {
        app_state.snippets.clone()
    }
}

impl FromRef<AppState> for UserState {
    fn from_ref(app_state: &AppState) -> UserState {
        app_state.users.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the route table and wraps it, outermost first, in the standard chain:
/// panic recovery, request id and request logging, security headers. `/ping` and
/// `/static` get only that chain; everything else also runs behind the dynamic or
/// protected chain (see `routes`), with sessions kept in `store`.
pub fn create_router<Store>(state: AppState, store: Store) -> Router
where
    Store: SessionStore + Clone,
{
    recover::install_panic_hook();

    let x_request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    // 1. Route table
    let mux = Router::new()
        .route("/ping", get(handlers::ping))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .merge(public::public_routes(&state, store.clone()))
        .merge(authenticated::authenticated_routes(&state, store))
        .with_state(state.clone());

    // 2. Standard chain, applied to every request including unmatched ones.
    mux.layer(
        ServiceBuilder::new()
            // 2a. Panic and server error boundary. Must stay outermost.
            .layer(axum::middleware::from_fn_with_state(
                state,
                recover::recover_panic,
            ))
            // 2b. Request correlation and logging.
            .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace_span_logger)
                    .on_request(log_request)
                    .on_response(
                        DefaultOnResponse::new()
                            .level(Level::INFO)
                            .latency_unit(tower_http::LatencyUnit::Millis),
                    ),
            )
            .layer(PropagateRequestIdLayer::new(x_request_id))
            // 2c. Security headers.
            .layer(from_fn(common_headers)),
    )
}
