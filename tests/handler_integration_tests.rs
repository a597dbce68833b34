mod common;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use common::TestApp;
use ssnipp::{
    AppConfig,
    mocks::{DUPLICATE_EMAIL, MOCK_EMAIL},
};

// --- Snippet view ---

#[tokio::test]
async fn test_view_existing_snippet() {
    let mut app = TestApp::new();

    let response = app.get("/view/1").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("console.log();"));
    assert!(response.body.contains("JavaScript"));
    assert!(response.body.contains("<pre><code id='snippet'>console.log();</code></pre>"));
    assert!(!response.body.contains("class='language-"));
    assert_eq!(
        response.header("content-type"),
        Some("text/html; charset=utf-8")
    );
}

#[tokio::test]
async fn test_view_rejects_bad_ids() {
    let mut app = TestApp::new();

    for uri in ["/view/2", "/view/-1", "/view/0", "/view/1.23", "/view/foo", "/view/"] {
        let response = app.get(uri).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{uri}");
    }
}

#[tokio::test]
async fn test_view_shows_flash_once() {
    let mut app = TestApp::new();
    app.login().await;
    let token = app.cookie(common::CSRF_COOKIE).unwrap();

    let created = app
        .post_form(
            "/create",
            &[
                ("content", "SELECT 1;"),
                ("language", "sql"),
                ("csrf_token", &token),
            ],
        )
        .await;
    assert_eq!(created.status, StatusCode::SEE_OTHER);
    assert_eq!(created.location(), Some("/view/2"));

    let first = app.get("/view/2").await;
    assert!(first.body.contains("Snippet successfully created!"));
    assert!(first.body.contains("SELECT 1;"));

    let second = app.get("/view/2").await;
    assert!(!second.body.contains("Snippet successfully created!"));
}

// --- Snippet create ---

#[tokio::test]
async fn test_home_renders_create_form_for_logged_in_user() {
    let mut app = TestApp::new();
    app.login().await;

    let response = app.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("action='/create'"));
    assert!(response.body.contains("<option value='plaintext' selected>"));
    assert!(response.body.contains("action='/logout'"));
}

#[tokio::test]
async fn test_create_validation_failures_rerender() {
    let mut app = TestApp::new();
    app.login().await;
    let token = app.cookie(common::CSRF_COOKIE).unwrap();

    let blank = app
        .post_form(
            "/create",
            &[("content", "   "), ("language", "rust"), ("csrf_token", &token)],
        )
        .await;
    assert_eq!(blank.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(blank.body.contains("This field cannot be blank"));
    assert!(blank.body.contains("<option value='rust' selected>"));

    let unknown = app
        .post_form(
            "/create",
            &[
                ("content", "IDENTIFICATION DIVISION."),
                ("language", "cobol"),
                ("csrf_token", &token),
            ],
        )
        .await;
    assert_eq!(unknown.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(unknown.body.contains("Choose a valid language"));
    assert!(unknown.body.contains("IDENTIFICATION DIVISION."));

    assert!(app.snippets.inserted().is_empty());
}

#[tokio::test]
async fn test_create_stores_snippet() {
    let mut app = TestApp::new();
    app.login().await;
    let token = app.cookie(common::CSRF_COOKIE).unwrap();

    let response = app
        .post_form(
            "/create",
            &[
                ("content", "fn main() {}"),
                ("language", "rust"),
                ("csrf_token", &token),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(
        app.snippets.inserted(),
        vec![("fn main() {}".to_string(), "rust".to_string())]
    );
}

#[tokio::test]
async fn test_undecodable_form_is_400() {
    let mut app = TestApp::new();
    app.login().await;
    let token = app.cookie(common::CSRF_COOKIE).unwrap();

    let request = Request::post("/create")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-csrf-token", token)
        .body(Body::from(r#"{"content":"x","language":"rust"}"#))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(app.snippets.inserted().is_empty());
}

// --- Signup ---

#[tokio::test]
async fn test_signup_scenarios() {
    let mut app = TestApp::new();
    let page = app.get("/signup").await;
    assert_eq!(page.status, StatusCode::OK);
    let token = page.csrf_field().unwrap();

    let cases: [(&str, &str, &str, &str, StatusCode, Option<&str>); 8] = [
        ("Bob", "bob@example.com", "validPa$$word", &token, StatusCode::SEE_OTHER, None),
        ("", "bob2@example.com", "validPa$$word", &token, StatusCode::UNPROCESSABLE_ENTITY, Some("This field cannot be blank")),
        ("Bob", "", "validPa$$word", &token, StatusCode::UNPROCESSABLE_ENTITY, Some("This field cannot be blank")),
        ("Bob", "bob@example.", "validPa$$word", &token, StatusCode::UNPROCESSABLE_ENTITY, Some("This field must be a valid email address")),
        ("Bob", "bob3@example.com", "", &token, StatusCode::UNPROCESSABLE_ENTITY, Some("This field cannot be blank")),
        ("Bob", "bob4@example.com", "pa$$", &token, StatusCode::UNPROCESSABLE_ENTITY, Some("This field must be at least 8 characters long")),
        ("Bob", DUPLICATE_EMAIL, "validPa$$word", &token, StatusCode::UNPROCESSABLE_ENTITY, Some("Email address is already in use")),
        ("Bob", "bob5@example.com", "validPa$$word", "wrongToken", StatusCode::BAD_REQUEST, None),
    ];

    for (name, email, password, csrf, status, message) in cases {
        let response = app
            .post_form(
                "/signup",
                &[
                    ("name", name),
                    ("email", email),
                    ("password", password),
                    ("csrf_token", csrf),
                ],
            )
            .await;

        assert_eq!(response.status, status, "{name}/{email}/{password}");
        if let Some(message) = message {
            assert!(response.body.contains(message), "{email}: missing {message}");
            assert!(response.body.contains("action='/signup'"));
        }
    }

    assert_eq!(app.users.inserted(), vec!["bob@example.com".to_string()]);
}

#[tokio::test]
async fn test_signup_success_flashes_on_login_page() {
    let mut app = TestApp::new();
    let token = app.csrf_token().await;

    let response = app
        .post_form(
            "/signup",
            &[
                ("name", "Bob"),
                ("email", "bob@example.com"),
                ("password", "validPa$$word"),
                ("csrf_token", &token),
            ],
        )
        .await;
    assert_eq!(response.location(), Some("/login"));

    let login = app.get("/login").await;
    assert!(login.body.contains("Your signup was successful. Please log in."));
}

#[tokio::test]
async fn test_signup_disabled_is_404() {
    let mut app = TestApp::with_config(AppConfig {
        allow_signup: false,
        ..AppConfig::default()
    });

    assert_eq!(app.get("/signup").await.status, StatusCode::NOT_FOUND);
    let token = app.csrf_token().await;
    let response = app
        .post_form(
            "/signup",
            &[
                ("name", "Bob"),
                ("email", "bob@example.com"),
                ("password", "validPa$$word"),
                ("csrf_token", &token),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(app.users.inserted().is_empty());

    let login = app.get("/login").await;
    assert!(!login.body.contains("href='/signup'"));
}

// --- Login ---

#[tokio::test]
async fn test_login_scenarios() {
    let mut app = TestApp::new();

    let cases: [(&str, &str, StatusCode, Option<&str>); 5] = [
        ("", "pa$$word", StatusCode::UNPROCESSABLE_ENTITY, Some("This field cannot be blank")),
        ("alice@", "pa$$word", StatusCode::UNPROCESSABLE_ENTITY, Some("This field must be a valid email address")),
        (MOCK_EMAIL, "", StatusCode::UNPROCESSABLE_ENTITY, Some("This field cannot be blank")),
        (MOCK_EMAIL, "not-the-password", StatusCode::UNPROCESSABLE_ENTITY, Some("Email or password is incorrect")),
        (MOCK_EMAIL, "pa$$word", StatusCode::SEE_OTHER, None),
    ];

    for (email, password, status, message) in cases {
        let token = app.csrf_token().await;
        let response = app
            .post_form(
                "/login",
                &[("email", email), ("password", password), ("csrf_token", &token)],
            )
            .await;

        assert_eq!(response.status, status, "{email}/{password}");
        match message {
            Some(message) => {
                assert!(response.body.contains(message), "{email}: missing {message}");
                assert!(!response.body.contains("value='pa$$word'"));
            }
            None => assert_eq!(response.location(), Some("/")),
        }
    }
}

#[tokio::test]
async fn test_unknown_email_is_indistinguishable_from_wrong_password() {
    let mut app = TestApp::new();
    let token = app.csrf_token().await;

    let response = app
        .post_form(
            "/login",
            &[
                ("email", "nobody@example.com"),
                ("password", "whatever-password"),
                ("csrf_token", &token),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Email or password is incorrect"));
    assert!(response.body.contains("value='nobody@example.com'"));
}

#[tokio::test]
async fn test_ping() {
    let mut app = TestApp::new();
    let response = app.get("/ping").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "OK");
}

#[tokio::test]
async fn test_static_files_served() {
    let mut app = TestApp::new();
    let response = app.get("/static/css/main.css").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.header("content-type").unwrap().starts_with("text/css"));

    let missing = app.get("/static/nope.css").await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}
