//! Requesting user, as asserted by the authenticating front end.
//!
//! The front end terminates authentication and forwards the username and
//! superuser flag in request headers. Requests without the user header are
//! anonymous.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub username: String,
    pub is_superuser: bool,
}

impl AuthUser {
    pub fn new(username: impl Into<String>, is_superuser: bool) -> Self {
        Self {
            username: username.into(),
            is_superuser,
        }
    }
}

pub async fn remote_user_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth = &state.config.auth;
    if let Some(user) = user_from_headers(request.headers(), &auth.user_header, &auth.superuser_header) {
        tracing::debug!(username = %user.username, superuser = user.is_superuser, "remote user");
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}

pub fn user_from_headers(headers: &HeaderMap, user_header: &str, superuser_header: &str) -> Option<AuthUser> {
    let username = headers
        .get(user_header)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|name| !name.is_empty())?;

    let is_superuser = headers
        .get(superuser_header)
        .and_then(|value| value.to_str().ok())
        .map(|flag| matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);

    Some(AuthUser::new(username, is_superuser))
}
