use askama::Template;
use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{Html, IntoResponse, Response},
};
use chrono::{Datelike, Utc};
use tower_sessions::Session;

use crate::{
    AppState,
    error::{AppError, AppResult},
    forms::{SnippetCreateForm, UserLoginForm, UserSignupForm},
    languages::{self, Language},
    middleware::{auth::RequestContext, csrf::CsrfToken},
    models::Snippet,
    session::FLASH,
};

/// TemplateData
///
/// Values every page can use: the footer year, a one-shot flash message, the nav state and
/// the CSRF token for embedded forms.
#[derive(Debug, Clone)]
pub struct TemplateData {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub csrf_token: String,
    pub allow_signup: bool,
    pub languages: Vec<Language>,
}

/// PageContext
///
/// Collects what a handler needs to build `TemplateData` without touching the session yet.
/// The flash message is only popped by `template_data`, so a request that ends in a
/// redirect or an error leaves it for the next rendered page.
pub struct PageContext {
    session: Session,
    context: RequestContext,
    csrf_token: String,
    allow_signup: bool,
}

impl FromRequestParts<AppState> for PageContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, message)| AppError::Internal(message.to_string()))?;
        let csrf_token = parts
            .extensions
            .get::<CsrfToken>()
            .map(|CsrfToken(token)| token.clone())
            .ok_or_else(|| AppError::Internal("csrf token missing from request".into()))?;
        let context = parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default();

        Ok(Self {
            session,
            context,
            csrf_token,
            allow_signup: state.config.allow_signup,
        })
    }
}

impl PageContext {
    pub async fn template_data(&self) -> AppResult<TemplateData> {
        let flash = self.session.remove::<String>(FLASH).await?;
        Ok(TemplateData {
            current_year: Utc::now().year(),
            flash,
            is_authenticated: self.context.is_authenticated,
            csrf_token: self.csrf_token.clone(),
            allow_signup: self.allow_signup,
            languages: languages::all(),
        })
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomePage {
    pub data: TemplateData,
    pub form: SnippetCreateForm,
}

#[derive(Template)]
#[template(path = "view.html")]
pub struct ViewPage {
    pub data: TemplateData,
    pub snippet: Snippet,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub struct SignupPage {
    pub data: TemplateData,
    pub form: UserSignupForm,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub data: TemplateData,
    pub form: UserLoginForm,
}

/// Renders fully before anything is written, so a template failure still becomes a clean
/// 500 instead of a truncated page.
pub fn render<T: Template>(status: StatusCode, page: &T) -> AppResult<Response> {
    let html = page.render()?;
    Ok((status, Html(html)).into_response())
}
