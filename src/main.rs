use std::{fmt::Display, net::SocketAddr, process, sync::Arc};

use sqlx::postgres::PgPoolOptions;
use ssnipp::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::PostgresRepository,
};
use tokio::net::TcpListener;
use tower_sessions_sqlx_store::PostgresStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Loads configuration, sets up logging, connects to Postgres, applies migrations for both
/// the application tables and the session table, then serves until the listener fails.
/// Any startup failure is logged and exits with status 1.
#[tokio::main]
async fn main() {
    // 1. Environment (.env is optional)
    dotenv::dotenv().ok();

    // 2. Logging, chosen by APP_ENV before the rest of the configuration is validated
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ssnipp=debug,tower_http=info".into());

    match Env::from_env() {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    // 3. Configuration
    let config = AppConfig::load().unwrap_or_else(|e| fatal("invalid configuration", e));
    tracing::info!(
        env = ?config.env,
        debug = config.debug,
        allow_signup = config.allow_signup,
        "configuration loaded"
    );

    // 4. Database
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(config.connect_options())
        .await
        .unwrap_or_else(|e| fatal("failed to connect to postgres", e));

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        fatal("failed to run migrations", e);
    }

    // 5. Session store
    let session_store = PostgresStore::new(pool.clone());
    if let Err(e) = session_store.migrate().await {
        fatal("failed to prepare session store", e);
    }

    // 6. State and router
    let repo = Arc::new(PostgresRepository::new(pool));
    let state = AppState {
        snippets: repo.clone(),
        users: repo,
        config: config.clone(),
    };
    let app = create_router(state, session_store);

    // 7. Server
    let bind_address = config.bind_address();
    let listener = TcpListener::bind(&bind_address)
        .await
        .unwrap_or_else(|e| fatal("failed to bind listener", e));

    tracing::info!(addr = %bind_address, "starting server");

    let result = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await;

    match result {
        Err(e) => fatal("server stopped", e),
        Ok(()) => fatal("server stopped", "listener closed"),
    }
}

fn fatal(context: &str, err: impl Display) -> ! {
    tracing::error!(error = %err, "{context}");
    process::exit(1);
}
