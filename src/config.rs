use std::env;

use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

/// AppConfig
///
/// Holds the application's entire configuration state, read once from the environment at
/// startup and immutable afterwards. Shared with handlers and middleware through `AppState`
/// and `FromRef`.
#[derive(Clone)]
pub struct AppConfig {
    // Listen address; ":4000" binds every interface.
    pub addr: String,
    // Diagnostic mode: 500 responses carry the failure message and trace.
    pub debug: bool,
    // Postgres connection parameters.
    pub db_host: String,
    pub db_port: u16,
    pub db_username: String,
    pub db_password: String,
    pub db_database: String,
    // When false the signup routes are not registered at all.
    pub allow_signup: bool,
    // Adds the `Secure` attribute to the session and CSRF cookies.
    pub cookie_secure: bool,
    // Runtime environment marker. Selects the log output format.
    pub env: Env,
}

/// Env
///
/// `Local` logs human-readable output, `Production` logs JSON lines.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Env {
    /// Reads `APP_ENV`; anything but `production` is `Local`.
    pub fn from_env() -> Self {
        match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        }
    }
}

/// ConfigError
///
/// Every startup configuration failure names the offending variable. Any of these is fatal.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("error parsing {name} environment variable: {value:?} is not a boolean")]
    InvalidBool { name: &'static str, value: String },

    #[error("error parsing {name} environment variable: {value:?} is not a port number")]
    InvalidPort { name: &'static str, value: String },
}

impl Default for AppConfig {
    /// default
    ///
    /// A non-panicking configuration for test state scaffolding; no environment access.
    fn default() -> Self {
        Self {
            addr: ":4000".to_string(),
            debug: false,
            db_host: "localhost".to_string(),
            db_port: 5432,
            db_username: "web".to_string(),
            db_password: "pass".to_string(),
            db_database: "ssnipp".to_string(),
            allow_signup: true,
            cookie_secure: false,
            env: Env::Local,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads all parameters from environment variables. The `DB_*` credentials are
    /// mandatory; everything else falls back to a default.
    ///
    /// # Errors
    /// Returns a `ConfigError` for a missing credential or an unparsable value. The caller
    /// is expected to log it and exit non-zero.
    pub fn load() -> Result<Self, ConfigError> {
        let env = Env::from_env();

        let db_port = match non_empty("DB_PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::InvalidPort { name: "DB_PORT", value })?,
            None => 5432,
        };

        Ok(Self {
            addr: non_empty("PORT").unwrap_or_else(|| ":4000".to_string()),
            debug: bool_var("DEBUG", false)?,
            db_host: non_empty("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
            db_port,
            db_username: required("DB_USERNAME")?,
            db_password: required("DB_PASSWORD")?,
            db_database: required("DB_DATABASE")?,
            allow_signup: bool_var("ALLOW_SIGNUP", true)?,
            cookie_secure: bool_var("COOKIE_SECURE", false)?,
            env,
        })
    }

    /// bind_address
    ///
    /// Turns the configured address into something `TcpListener::bind` accepts:
    /// ":4000" and "4000" both become "0.0.0.0:4000"; "host:port" is kept as is.
    pub fn bind_address(&self) -> String {
        if let Some(port) = self.addr.strip_prefix(':') {
            format!("0.0.0.0:{port}")
        } else if self.addr.chars().all(|c| c.is_ascii_digit()) {
            format!("0.0.0.0:{}", self.addr)
        } else {
            self.addr.clone()
        }
    }

    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_username)
            .password(&self.db_password)
            .database(&self.db_database)
    }
}

fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    non_empty(name).ok_or(ConfigError::Missing(name))
}

fn bool_var(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match non_empty(name) {
        None => Ok(default),
        Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidBool { name, value }),
    }
}

/// Accepts `1 t T TRUE true True` and `0 f F FALSE false False`; nothing else.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
