//! Admin API key extractor for operator-only routes.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::app::AppState;
use crate::error::ApiError;

/// Header carrying the admin key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Proof that the request carried the configured admin key.
#[derive(Debug, Clone, Copy)]
pub struct AdminKey;

impl AdminKey {
    /// Compares in constant time. An empty configured key matches nothing.
    pub fn matches(configured: &str, presented: &str) -> bool {
        !configured.is_empty()
            && constant_time_eq::constant_time_eq(configured.as_bytes(), presented.as_bytes())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminKey {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Invalid or missing API key".to_string()))?;

        if AdminKey::matches(&state.config.security.admin_api_key, presented) {
            Ok(AdminKey)
        } else {
            tracing::warn!("Rejected admin request with invalid API key");
            Err(ApiError::Forbidden("Admin access required".to_string()))
        }
    }
}
