// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! LinkedIn OAuth authentication routes.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::services::session::SESSION_TTL_DAYS;
use crate::AppState;

/// Cookie holding the OAuth state nonce between authorize and callback.
pub const STATE_COOKIE: &str = "li_oauth_state";

const STATE_COOKIE_MAX_AGE_MINUTES: i64 = 10;
const STATE_NONCE_BYTES: usize = 16;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/linkedin", get(authorize))
        .route("/api/auth/callback", get(callback))
        .route("/api/auth/logout", get(logout).post(logout))
}

/// Generate a random OAuth state nonce.
fn generate_state() -> Result<String> {
    let mut bytes = [0u8; STATE_NONCE_BYTES];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("State nonce generation failed")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Constant-time comparison of the returned state against the cookie.
fn state_matches(returned: &str, expected: &str) -> bool {
    !expected.is_empty() && bool::from(returned.as_bytes().ct_eq(expected.as_bytes()))
}

fn state_cookie(config: &Config, nonce: String) -> Cookie<'static> {
    Cookie::build((STATE_COOKIE, nonce))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure())
        .max_age(time::Duration::minutes(STATE_COOKIE_MAX_AGE_MINUTES))
        .build()
}

/// Session cookie carrying a signed session token.
pub(crate) fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build((config.session_cookie_name.clone(), token))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure())
        .max_age(time::Duration::days(SESSION_TTL_DAYS))
        .build()
}

/// Removal cookie with the same attributes the cookie was created with.
fn expired_cookie(config: &Config, name: String) -> Cookie<'static> {
    Cookie::build((name, ""))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .secure(config.cookie_secure())
        .max_age(time::Duration::ZERO)
        .build()
}

/// Start OAuth flow - redirect to LinkedIn authorization.
async fn authorize(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let nonce = generate_state()?;
    let auth_url = state.linkedin.authorization_url(&nonce);

    tracing::info!(
        redirect_uri = %state.config.redirect_uri(),
        "Starting OAuth flow, redirecting to LinkedIn"
    );
    tracing::debug!(auth_url = %auth_url, "LinkedIn authorization URL");

    let jar = jar.add(state_cookie(&state.config, nonce));
    Ok((jar, Redirect::temporary(&auth_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth callback - exchange code for tokens, store user, create session.
///
/// The state cookie is single-use: every response from here clears it.
async fn callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> std::result::Result<(CookieJar, Redirect), (CookieJar, AppError)> {
    let expected = jar.get(STATE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.add(expired_cookie(&state.config, STATE_COOKIE.to_string()));

    match handle_callback(&state, params, expected).await {
        Ok(token) => {
            let jar = jar.add(session_cookie(&state.config, token));
            Ok((jar, Redirect::temporary(&state.config.post_login_redirect)))
        }
        Err(e) => Err((jar, e)),
    }
}

/// Check the callback parameters, complete the login, and sign a session.
async fn handle_callback(
    state: &AppState,
    params: CallbackParams,
    expected: Option<String>,
) -> Result<String> {
    // Check for OAuth errors
    if let Some(error) = params.error {
        let message = match params.error_description.filter(|d| !d.is_empty()) {
            Some(description) => format!("{} - {}", error, description),
            None => error,
        };
        tracing::warn!(error = %message, "OAuth error from LinkedIn");
        return Err(AppError::OAuthProvider(message));
    }

    let code = match (params.code, params.state, expected) {
        (Some(code), Some(returned), Some(expected))
            if !code.is_empty() && state_matches(&returned, &expected) =>
        {
            code
        }
        _ => {
            tracing::warn!("OAuth callback with missing or mismatched state");
            return Err(AppError::BadRequest("Invalid state or code".to_string()));
        }
    };

    tracing::info!("Exchanging authorization code for tokens");

    let user = state.linkedin.complete_login(&code).await.map_err(|e| {
        tracing::error!(error = %e, "LinkedIn callback error");
        AppError::AuthenticationFailed
    })?;

    let session = AuthUser {
        user_id: user.id,
        external_id: user.external_id,
        email: user.email,
    };
    state.sessions.sign_default(&session).map_err(|e| {
        tracing::error!(error = %e, "Session signing failed");
        AppError::AuthenticationFailed
    })
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub ok: bool,
    pub clear_cache: bool,
}

/// Logout - clear the session cookie.
///
/// Sessions are stateless, so a token copied elsewhere stays valid until it
/// expires.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<LogoutResponse>) {
    let jar = jar.add(expired_cookie(
        &state.config,
        state.config.session_cookie_name.clone(),
    ));

    (
        jar,
        Json(LogoutResponse {
            ok: true,
            clear_cache: true,
        }),
    )
}
