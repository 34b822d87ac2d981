use std::convert::Infallible;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::{auth::repo_types::User, error::AppError, state::AppState};

/// Token from an `Authorization: Bearer <token>` header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}

/// The authenticated caller. Rejects with 401 before the handler runs.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthenticated)?;

        let Some(user_id) = state.sessions.resolve(token).await else {
            warn!("invalid or expired token");
            return Err(AppError::InvalidToken);
        };

        let user = User::find_by_id(&state.db, user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        Ok(AuthUser(user))
    }
}

/// Bearer token if one was sent; never rejects.
pub struct MaybeBearer(pub Option<String>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MaybeBearer {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeBearer(bearer_token(parts).map(str::to_string)))
    }
}
