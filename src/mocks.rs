//! In-memory stand-ins for the repositories, used by the integration tests and handy for
//! running the router without a database.

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use chrono::Utc;

use crate::{
    models::{ModelError, Snippet},
    repository::{SnippetRepository, UserRepository},
};

/// MockSnippetRepository
///
/// Seeded with snippet 1 (`console.log();`, javascript). New inserts get increasing ids
/// starting at 2 and are recorded so tests can assert nothing was written. `get` can be
/// made to panic, for exercising the recovery boundary.
pub struct MockSnippetRepository {
    snippets: Mutex<HashMap<i64, Snippet>>,
    inserted: Mutex<Vec<(String, String)>>,
    panic_on_get: AtomicBool,
}

impl MockSnippetRepository {
    pub fn new() -> Self {
        let seed = Snippet {
            id: 1,
            content: "console.log();".to_string(),
            created: Utc::now(),
            language: "javascript".to_string(),
        };
        Self {
            snippets: Mutex::new(HashMap::from([(1, seed)])),
            inserted: Mutex::new(Vec::new()),
            panic_on_get: AtomicBool::new(false),
        }
    }

    pub fn panic_on_get(&self, panic: bool) {
        self.panic_on_get.store(panic, Ordering::SeqCst);
    }

    /// `(content, language)` of every successful insert, in order.
    pub fn inserted(&self) -> Vec<(String, String)> {
        self.inserted.lock().unwrap().clone()
    }
}

impl Default for MockSnippetRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SnippetRepository for MockSnippetRepository {
    async fn get(&self, id: i64) -> Result<Snippet, ModelError> {
        if self.panic_on_get.load(Ordering::SeqCst) {
            panic!("snippet store exploded while loading {id}");
        }
        self.snippets
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(ModelError::NoRecord)
    }

    async fn insert(&self, content: &str, language: &str) -> Result<i64, ModelError> {
        let mut snippets = self.snippets.lock().unwrap();
        let id = snippets.keys().max().copied().unwrap_or(0) + 1;
        snippets.insert(
            id,
            Snippet {
                id,
                content: content.to_string(),
                created: Utc::now(),
                language: language.to_string(),
            },
        );
        self.inserted
            .lock()
            .unwrap()
            .push((content.to_string(), language.to_string()));
        Ok(id)
    }
}

pub const MOCK_EMAIL: &str = "alice@example.com";
pub const MOCK_PASSWORD: &str = "pa$$word";
pub const MOCK_USER_ID: i64 = 1;
pub const DUPLICATE_EMAIL: &str = "dupe@example.com";

/// MockUserRepository
///
/// Knows a single account, `alice@example.com` / `pa$$word` with id 1. Signups with
/// `dupe@example.com` fail as duplicates. Accounts can be removed to simulate a user
/// deleted while still logged in, and `exists` can be made to fail.
pub struct MockUserRepository {
    live: Mutex<HashSet<i64>>,
    inserted: Mutex<Vec<String>>,
    fail_exists: AtomicBool,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self {
            live: Mutex::new(HashSet::from([MOCK_USER_ID])),
            inserted: Mutex::new(Vec::new()),
            fail_exists: AtomicBool::new(false),
        }
    }

    pub fn remove_user(&self, id: i64) {
        self.live.lock().unwrap().remove(&id);
    }

    pub fn restore_user(&self, id: i64) {
        self.live.lock().unwrap().insert(id);
    }

    pub fn fail_exists(&self, fail: bool) {
        self.fail_exists.store(fail, Ordering::SeqCst);
    }

    /// Emails of every successful signup, in order.
    pub fn inserted(&self) -> Vec<String> {
        self.inserted.lock().unwrap().clone()
    }
}

impl Default for MockUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn insert(&self, _name: &str, email: &str, _password: &str) -> Result<(), ModelError> {
        if email == DUPLICATE_EMAIL {
            return Err(ModelError::DuplicateEmail);
        }
        self.inserted.lock().unwrap().push(email.to_string());
        Ok(())
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, ModelError> {
        if email == MOCK_EMAIL && password == MOCK_PASSWORD {
            return Ok(MOCK_USER_ID);
        }
        Err(ModelError::InvalidCredentials)
    }

    async fn exists(&self, id: i64) -> Result<bool, ModelError> {
        if self.fail_exists.load(Ordering::SeqCst) {
            return Err(ModelError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(self.live.lock().unwrap().contains(&id))
    }
}
