use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

use crate::languages;

// --- Core Application Schemas (Mapped to Database) ---

/// Snippet
///
/// A single shared code snippet, one row of the `snippets` table.
/// `language` holds a catalogue key (see `languages`), never the display label.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct Snippet {
    pub id: i64,
    pub content: String,
    pub created: DateTime<Utc>,
    pub language: String,
}

impl Snippet {
    /// Creation time in UTC, e.g. `17 Mar 2024 at 09:05`.
    pub fn human_date(&self) -> String {
        human_date(&self.created)
    }

    pub fn language_label(&self) -> &'static str {
        languages::label(&self.language)
    }
}

/// human_date
///
/// Returns the empty string for the epoch (the zero value used by `Default`).
pub fn human_date(t: &DateTime<Utc>) -> String {
    if t.timestamp() == 0 {
        return String::new();
    }
    t.format("%d %b %Y at %H:%M").to_string()
}

// --- Collaborator Errors ---

/// ModelError
///
/// Errors surfaced by the snippet and user repositories. The first three variants are
/// expected outcomes that handlers classify into 404/422 responses; the rest are
/// infrastructure failures.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("models: no matching record found")]
    NoRecord,

    #[error("models: invalid credentials")]
    InvalidCredentials,

    #[error("models: duplicate email")]
    DuplicateEmail,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
