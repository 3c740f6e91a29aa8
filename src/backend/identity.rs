/**
 * Gateway Identity Extraction
 *
 * Authentication is delegated to an external identity provider that sits in
 * front of this service and injects the authenticated user's identity as
 * request headers. This module extracts that identity; it never validates
 * credentials itself.
 *
 * # Headers
 *
 * - `x-user-id` - The authenticated account id (required)
 * - `x-user-name` - The display name (optional, falls back to the id)
 *
 * Handlers that mutate user-owned data take `UserIdentity` as an extractor
 * argument; requests without the headers are rejected with 401 before the
 * handler body runs.
 */

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::backend::error::ApiError;

/// Header carrying the authenticated account id
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the display name
pub const USER_NAME_HEADER: &str = "x-user-name";

/// The authenticated identity injected by the upstream gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// Account-level user id
    pub user_id: String,
    /// Display name shown to other collaborators
    pub user_name: String,
}

impl<S> FromRequestParts<S> for UserIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                tracing::warn!("[Server] Request without gateway identity headers");
                ApiError::unauthorized("Missing authenticated identity")
            })?
            .to_string();

        let user_name = parts
            .headers
            .get(USER_NAME_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(String::from)
            .unwrap_or_else(|| user_id.clone());

        Ok(UserIdentity { user_id, user_name })
    }
}
