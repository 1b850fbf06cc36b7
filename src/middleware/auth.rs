// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session cookie authentication middleware.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

pub use crate::services::session::AuthUser;

/// Middleware that requires a valid session cookie.
///
/// The session is read from the cookie only; there is no bearer-header path.
/// On success the [`AuthUser`] is inserted into request extensions.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = jar
        .get(&state.config.session_cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(AppError::Unauthorized)?;

    let auth_user = state.sessions.verify(&token).ok_or(AppError::InvalidToken)?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
