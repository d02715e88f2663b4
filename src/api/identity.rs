//! Caller identity for the per-user data endpoints.
//!
//! Identity is currently the raw `x-user-id` header, trusted as sent.
//! Endpoints only ever see a [`UserId`], so swapping this extractor for
//! verified authentication leaves the handlers untouched.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::error::ApiError;

/// Header carrying the caller's user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Public message when no identity is present.
pub const MSG_USER_ID_REQUIRED: &str = "User ID is required.";

/// Identifier that scopes every store read and write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    /// Read the identity from request headers. Empty values count as absent.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(|v| UserId(v.to_string()))
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = Self::from_headers(&parts.headers)
            .ok_or_else(|| ApiError::BadRequest(MSG_USER_ID_REQUIRED.to_string()))?;

        tracing::Span::current().record("user_id", user_id.as_str());

        Ok(user_id)
    }
}
