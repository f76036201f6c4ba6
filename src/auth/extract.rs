use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::state::AppState;

use super::session::token_from_cookies;
use super::{AuthError, UserIdentity};

/// The signed-in user; rejects with 401 otherwise.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub UserIdentity);

/// The signed-in user if there is one, plus the presented token.
#[derive(Debug, Clone, Default)]
pub struct MaybeUser {
    pub user: Option<UserIdentity>,
    pub token: Option<String>,
}

/// Session cookie first, then `Authorization: Bearer`.
pub fn session_token(parts: &Parts) -> Option<String> {
    let from_cookie = parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(token_from_cookies)
        .map(str::to_string);

    from_cookie.or_else(|| {
        parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(parts) else {
            return Ok(Self::default());
        };
        let user = state.sessions.lookup(&token).await;
        Ok(Self {
            user,
            token: Some(token),
        })
    }
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let maybe = MaybeUser::from_request_parts(parts, state).await?;
        maybe
            .user
            .map(CurrentUser)
            .ok_or(ApiError::Auth(AuthError::NotAuthenticated))
    }
}
