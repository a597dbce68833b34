//! Shared harness for the router tests: a cookie-keeping client driving the full router
//! in-process, backed by the in-memory repositories and session store.
#![allow(dead_code)]

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use ssnipp::{
    AppConfig, AppState, create_router,
    mocks::{MOCK_EMAIL, MOCK_PASSWORD, MockSnippetRepository, MockUserRepository},
    session::SESSION_COOKIE,
};
use tower::ServiceExt;
use tower_sessions::{
    MemoryStore, SessionStore,
    session::{Id, Record},
    session_store,
};

pub const CSRF_COOKIE: &str = "csrf_token";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Value of the hidden `csrf_token` input embedded in the page, if any.
    pub fn csrf_field(&self) -> Option<String> {
        let marker = "name='csrf_token' value='";
        let start = self.body.find(marker)? + marker.len();
        let end = self.body[start..].find('\'')?;
        Some(self.body[start..start + end].to_string())
    }
}

/// TestApp
///
/// Holds the router plus handles on everything behind it, and a browser-like cookie jar
/// that replays cookies and applies `Set-Cookie` from each response.
pub struct TestApp {
    pub router: Router,
    pub snippets: Arc<MockSnippetRepository>,
    pub users: Arc<MockUserRepository>,
    pub store: MemoryStore,
    cookies: HashMap<String, String>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let snippets = Arc::new(MockSnippetRepository::new());
        let users = Arc::new(MockUserRepository::new());
        let store = MemoryStore::default();

        let state = AppState {
            snippets: snippets.clone(),
            users: users.clone(),
            config,
        };

        Self {
            router: create_router(state, store.clone()),
            snippets,
            users,
            store,
            cookies: HashMap::new(),
        }
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    pub fn set_cookie(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub fn clear_cookies(&mut self) {
        self.cookies.clear();
    }

    pub async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if !self.cookies.is_empty() {
            let cookie_header = self
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            request
                .headers_mut()
                .insert(header::COOKIE, cookie_header.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();

        for set_cookie in response.headers().get_all(header::SET_COOKIE) {
            let set_cookie = set_cookie.to_str().unwrap();
            let pair = set_cookie.split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            if set_cookie.contains("Max-Age=0") || value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = Request::get(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// Loads the login page and returns the token embedded in its form.
    pub async fn csrf_token(&mut self) -> String {
        let page = self.get("/login").await;
        assert_eq!(page.status, StatusCode::OK);
        page.csrf_field().expect("login page embeds a csrf token")
    }

    /// Logs in as the mock user and returns the login response.
    pub async fn login(&mut self) -> TestResponse {
        let token = self.csrf_token().await;
        self.post_form(
            "/login",
            &[
                ("email", MOCK_EMAIL),
                ("password", MOCK_PASSWORD),
                ("csrf_token", &token),
            ],
        )
        .await
    }

    pub fn session_id(&self) -> Option<Id> {
        self.cookie(SESSION_COOKIE)?.parse().ok()
    }

    /// The stored record for the session cookie currently held, if the store has one.
    pub async fn session_record(&self) -> Option<Record> {
        let id = self.session_id()?;
        self.store.load(&id).await.unwrap()
    }

    pub async fn load_record(&self, id: &Id) -> Option<Record> {
        self.store.load(id).await.unwrap()
    }
}

/// UnavailableStore
///
/// A session store whose backend is always down. Counts every call so tests can check the
/// request was not retried.
#[derive(Debug, Clone, Default)]
pub struct UnavailableStore {
    calls: Arc<AtomicUsize>,
}

impl UnavailableStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> session_store::Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(session_store::Error::Backend(
            "session database unreachable".to_string(),
        ))
    }
}

#[async_trait::async_trait]
impl SessionStore for UnavailableStore {
    async fn save(&self, _record: &Record) -> session_store::Result<()> {
        self.fail()
    }

    async fn load(&self, _id: &Id) -> session_store::Result<Option<Record>> {
        self.fail()
    }

    async fn delete(&self, _id: &Id) -> session_store::Result<()> {
        self.fail()
    }
}

/// Full router over the mock repositories with sessions kept in `store`.
pub fn router_with_store<Store: SessionStore + Clone>(store: Store) -> Router {
    let state = AppState {
        snippets: Arc::new(MockSnippetRepository::new()),
        users: Arc::new(MockUserRepository::new()),
        config: AppConfig::default(),
    };
    create_router(state, store)
}
