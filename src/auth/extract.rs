use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::claims::{verify_token, Actor};
use crate::app::AppState;
use crate::error::ErrorResponse;

/// Extractor that requires a valid bearer token.
///
/// Example:
/// ```ignore
/// async fn protected_route(RequireAuth(actor): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}", actor.name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth(pub Actor);

impl std::ops::Deref for RequireAuth {
    type Target = Actor;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidFormat,
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match &self {
            AuthError::MissingToken => "Missing authorization token",
            AuthError::InvalidFormat => "Invalid authorization format",
            AuthError::InvalidToken => "Invalid or expired token",
        };

        let body = ErrorResponse {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            request_id: None,
        };

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for RequireAuth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidFormat)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidFormat)?;

        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let claims = verify_token(token, &state.settings.auth_jwt_secret).map_err(|e| {
            tracing::warn!(error = %e, "JWT verification failed");
            AuthError::InvalidToken
        })?;

        let actor = Actor::from_claims(&claims).map_err(|e| {
            tracing::warn!(error = %e, "Failed to build actor context");
            AuthError::InvalidToken
        })?;

        Ok(RequireAuth(actor))
    }
}
