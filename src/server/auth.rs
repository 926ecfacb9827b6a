//! Caller identity as established by the upstream login layer.

use axum::{extract::FromRequestParts, http::request::Parts, http::StatusCode};
use std::future::Future;

use super::error::ApiError;

/// Header carrying the authenticated user name
pub const USER_HEADER: &str = "x-authenticated-user";

/// Extractor for the authenticated user. Rejects with 401 if the header is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        let user = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|user| !user.is_empty())
            .map(|user| AuthUser(user.to_string()))
            .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Authentication required"));

        std::future::ready(user)
    }
}
