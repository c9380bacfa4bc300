//! Resolves the calling user from a header set by the upstream auth layer,
//! and on the routes that need it, the preference record of that user.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use models::{Preference, User};
use tracing::warn;

use crate::errors::ApiError;
use crate::state::ServerState;

#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Stored preferences of the current user; the default record when none were saved.
#[derive(Clone, Debug)]
pub struct SessionPreference(pub Preference);

/// Middleware: reject requests that carry no usable user id with 401.
pub async fn require_user(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let raw = req
        .headers()
        .get(&state.user_header)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let user = match User::new(raw) {
        Ok(user) => user,
        Err(e) => {
            warn!(path = %req.uri().path(), err = %e, "request without a resolvable user");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Middleware: attach the caller's [`SessionPreference`]. Must run inside `require_user`.
pub async fn load_preferences(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(CurrentUser(user)) = req.extensions().get::<CurrentUser>().cloned() else {
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let pref = match state.sessions.load_preferences(&user).await {
        Ok(pref) => pref.unwrap_or_default(),
        Err(e) => return ApiError::internal("unable to read user preferences", e).into_response(),
    };
    req.extensions_mut().insert(SessionPreference(pref));
    next.run(req).await
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(StatusCode::UNAUTHORIZED)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionPreference
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionPreference>()
            .cloned()
            .ok_or_else(|| ApiError::internal("unable to read user preferences", "no session preference"))
    }
}
