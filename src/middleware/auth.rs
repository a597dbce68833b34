use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderValue, header, request::Parts},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::{Session, session::Id};

use crate::{
    error::AppResult,
    repository::UserState,
    session::{AUTHENTICATED_USER_ID, REDIRECT_PATH_AFTER_LOGIN},
};

/// RequestContext
///
/// Per-request facts computed by `authenticate`. Handlers and later middleware read it
/// through the extractor below; outside the dynamic chain it is simply the default
/// (anonymous, no session).
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub session_id: Option<Id>,
    pub is_authenticated: bool,
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}

/// authenticate
///
/// Resolves the session's authenticated user id against the user store. An id that no
/// longer exists reads as anonymous, but the stale id is left in the session. A store
/// failure aborts the request with a 500.
pub async fn authenticate(
    State(users): State<UserState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let user_id = session
        .get::<i64>(AUTHENTICATED_USER_ID)
        .await?
        .unwrap_or_default();

    let is_authenticated = if user_id == 0 {
        false
    } else {
        let exists = users.exists(user_id).await?;
        if !exists {
            tracing::debug!(user_id, "session refers to a user that no longer exists");
        }
        exists
    };

    request.extensions_mut().insert(RequestContext {
        session_id: session.id(),
        is_authenticated,
    });

    Ok(next.run(request).await)
}

/// require_authentication
///
/// Guards protected routes. Anonymous requests remember their path for the post-login
/// redirect and are sent to `/login` with a 303. Authenticated responses are marked
/// `Cache-Control: no-store`.
pub async fn require_authentication(
    context: RequestContext,
    session: Session,
    request: Request,
    next: Next,
) -> AppResult<Response> {
    if !context.is_authenticated {
        session
            .insert(REDIRECT_PATH_AFTER_LOGIN, request.uri().path())
            .await?;
        return Ok(Redirect::to("/login").into_response());
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}
