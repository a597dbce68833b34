use axum::{
    Form,
    extract::{Path, State, rejection::FormRejection},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::{
    error::{AppError, AppResult},
    forms::{SnippetCreateForm, UserLoginForm, UserSignupForm},
    models::ModelError,
    repository::{SnippetState, UserState},
    session::{AUTHENTICATED_USER_ID, FLASH, REDIRECT_PATH_AFTER_LOGIN},
    templates::{HomePage, LoginPage, PageContext, SignupPage, ViewPage, render},
};

/// Unwraps a decoded form, answering 400 when the body could not be decoded.
fn decoded<T>(form: Result<Form<T>, FormRejection>) -> AppResult<T> {
    match form {
        Ok(Form(form)) => Ok(form),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "form decode failed");
            Err(AppError::Client(StatusCode::BAD_REQUEST))
        }
    }
}

/// ping
///
/// Liveness check, outside the session and CSRF layers.
pub async fn ping() -> &'static str {
    "OK"
}

/// home
///
/// [Protected] Shows the create form with the default language preselected.
pub async fn home(page: PageContext) -> AppResult<Response> {
    let data = page.template_data().await?;
    render(
        StatusCode::OK,
        &HomePage {
            data,
            form: SnippetCreateForm::new(),
        },
    )
}

/// snippet_view
///
/// Renders one snippet. Ids that are not positive integers and ids with no record are
/// both 404.
pub async fn snippet_view(
    page: PageContext,
    State(snippets): State<SnippetState>,
    Path(id): Path<String>,
) -> AppResult<Response> {
    let id = match id.parse::<i64>() {
        Ok(id) if id >= 1 => id,
        _ => return Err(AppError::NotFound),
    };

    let snippet = match snippets.get(id).await {
        Ok(snippet) => snippet,
        Err(ModelError::NoRecord) => return Err(AppError::NotFound),
        Err(e) => return Err(e.into()),
    };

    let data = page.template_data().await?;
    render(StatusCode::OK, &ViewPage { data, snippet })
}

/// snippet_create_post
///
/// [Protected] Validates and stores a snippet, then redirects to it with a flash message.
pub async fn snippet_create_post(
    page: PageContext,
    session: Session,
    State(snippets): State<SnippetState>,
    form: Result<Form<SnippetCreateForm>, FormRejection>,
) -> AppResult<Response> {
    let mut form = decoded(form)?;

    if !form.validate() {
        let data = page.template_data().await?;
        return render(StatusCode::UNPROCESSABLE_ENTITY, &HomePage { data, form });
    }

    let id = snippets.insert(&form.content, &form.language).await?;
    tracing::info!(snippet_id = id, "snippet created");

    session.insert(FLASH, "Snippet successfully created!").await?;
    Ok(Redirect::to(&format!("/view/{id}")).into_response())
}

pub async fn user_signup(page: PageContext) -> AppResult<Response> {
    let data = page.template_data().await?;
    render(
        StatusCode::OK,
        &SignupPage {
            data,
            form: UserSignupForm::default(),
        },
    )
}

/// user_signup_post
///
/// Creates the account and sends the user to the login page. Validation failures and a
/// taken email address re-render the form with 422.
pub async fn user_signup_post(
    page: PageContext,
    session: Session,
    State(users): State<UserState>,
    form: Result<Form<UserSignupForm>, FormRejection>,
) -> AppResult<Response> {
    let mut form = decoded(form)?;

    if form.validate() {
        match users.insert(&form.name, &form.email, &form.password).await {
            Ok(()) => {
                session
                    .insert(FLASH, "Your signup was successful. Please log in.")
                    .await?;
                return Ok(Redirect::to("/login").into_response());
            }
            Err(ModelError::DuplicateEmail) => {
                form.validator
                    .add_field_error("email", "Email address is already in use");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let data = page.template_data().await?;
    render(StatusCode::UNPROCESSABLE_ENTITY, &SignupPage { data, form })
}

pub async fn user_login(page: PageContext) -> AppResult<Response> {
    let data = page.template_data().await?;
    render(
        StatusCode::OK,
        &LoginPage {
            data,
            form: UserLoginForm::default(),
        },
    )
}

/// user_login_post
///
/// On valid credentials the session token is renewed before the user id is written, then
/// the user is sent to the path remembered by the access guard (consumed here) or to `/`.
pub async fn user_login_post(
    page: PageContext,
    session: Session,
    State(users): State<UserState>,
    form: Result<Form<UserLoginForm>, FormRejection>,
) -> AppResult<Response> {
    let mut form = decoded(form)?;

    if form.validate() {
        match users.authenticate(&form.email, &form.password).await {
            Ok(user_id) => {
                session.cycle_id().await?;
                session.insert(AUTHENTICATED_USER_ID, user_id).await?;

                let target = session
                    .remove::<String>(REDIRECT_PATH_AFTER_LOGIN)
                    .await?
                    .filter(|path| is_local_path(path))
                    .unwrap_or_else(|| "/".to_string());

                tracing::info!(user_id, "user logged in");
                return Ok(Redirect::to(&target).into_response());
            }
            Err(ModelError::InvalidCredentials) => {
                form.validator
                    .add_non_field_error("Email or password is incorrect");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let data = page.template_data().await?;
    render(StatusCode::UNPROCESSABLE_ENTITY, &LoginPage { data, form })
}

/// user_logout_post
///
/// [Protected] Renews the session token and drops the user id.
pub async fn user_logout_post(session: Session) -> AppResult<Redirect> {
    session.cycle_id().await?;
    session.remove_value(AUTHENTICATED_USER_ID).await?;
    session
        .insert(FLASH, "You've been logged out successfully!")
        .await?;
    Ok(Redirect::to("/"))
}

/// Paths recorded by the access guard start with a single `/`; anything else falls back
/// to the home page.
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//")
}
