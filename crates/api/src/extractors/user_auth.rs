//! Requester authentication extractor.
//!
//! The identity service mints access tokens; this service only verifies them
//! and reads the user id from the subject claim.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use shared::jwt::JwtError;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// Authenticated requester from a Bearer token.
#[derive(Debug, Clone, Copy)]
pub struct UserAuth {
    /// User ID from the JWT subject claim.
    pub user_id: Uuid,
}

/// Returns the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = bearer_token(auth_header).ok_or_else(|| {
            ApiError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        let user_id = state.verifier.authenticate(token).map_err(|e| match e {
            JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
            other => {
                tracing::debug!(error = %other, "Access token rejected");
                ApiError::Unauthorized("Invalid or expired token".to_string())
            }
        })?;

        Ok(UserAuth { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
