use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::repo_types::User;
use crate::{error::AppError, state::AppState};

/// Resolves the session token in `Authorization` to the user holding it.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("unauthorized".into()))?;

        let token = bearer_token(header)
            .ok_or_else(|| AppError::Unauthorized("unauthorized".into()))?;

        let user = state.users.authenticate(token).await?;
        Ok(AuthUser(user))
    }
}

/// Accepts a bare token or `Bearer <token>`.
fn bearer_token(header: &str) -> Option<&str> {
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .unwrap_or(header)
        .trim();
    (!token.is_empty()).then_some(token)
}
