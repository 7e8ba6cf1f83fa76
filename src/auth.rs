//! The service doesn't authenticate anyone itself. An upstream gateway verifies the caller and
//! forwards the user's ID in [AUTHENTICATED_USER_HEADER]; handlers receive it as a [CurrentUser].

use crate::routing_utils::UnauthenticatedResponse;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::debug;

/// Header carrying the ID of the user the upstream gateway authenticated
pub const AUTHENTICATED_USER_HEADER: &str = "x-authenticated-user-id";

/// The authenticated user a request is acting on behalf of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub user_id: i32,
}

impl CurrentUser {
    /// Reads the current user out of request headers, if a valid one is present
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Option<Self> {
        let raw_id = headers.get(AUTHENTICATED_USER_HEADER)?.to_str().ok()?;
        let user_id = raw_id.trim().parse::<i32>().ok()?;

        Some(CurrentUser { user_id })
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = UnauthenticatedResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let current_user = Self::from_headers(&parts.headers);
        if current_user.is_none() {
            debug!("Request arrived without a usable {AUTHENTICATED_USER_HEADER} header");
        }

        current_user.ok_or(UnauthenticatedResponse)
    }
}
