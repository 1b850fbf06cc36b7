// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{ProfileUpdate, User};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use validator::Validate;

/// API routes (require a session cookie).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/onboarding/complete", post(complete_onboarding))
        .route("/api/auth/refresh", post(refresh_token))
}

#[derive(Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

// ─── User Profile ────────────────────────────────────────────

/// Current user response. Never includes tokens.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub headline: Option<String>,
    pub profile_url: Option<String>,
    pub profile_picture: Option<String>,
    pub location: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            full_name: user.full_name,
            email: user.email,
            headline: user.headline,
            profile_url: user.profile_url,
            profile_picture: user.profile_picture,
            location: user.location,
        }
    }
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let user_profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    Ok(Json(user_profile.into()))
}

// ─── Onboarding ──────────────────────────────────────────────

/// Set email and/or profile picture; other fields are left alone.
async fn complete_onboarding(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    payload: std::result::Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<OkResponse>> {
    let Json(update) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let update = update.normalized();

    update
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    if update.is_empty() {
        return Err(AppError::BadRequest("nothing to update".to_string()));
    }

    state
        .db
        .update_profile(&user.user_id, &update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user.user_id)))?;

    tracing::info!(
        user_id = %user.user_id,
        fields = ?update.update_mask(),
        "Onboarding profile updated"
    );

    Ok(Json(OkResponse { ok: true }))
}

// ─── Token Refresh ───────────────────────────────────────────

#[derive(Serialize)]
pub struct RefreshResponse {
    pub ok: bool,
    pub expires_in: Option<i64>,
    pub token_expires_at: i64,
}

/// Refresh the stored LinkedIn access token for the session's user.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<RefreshResponse>> {
    let outcome = state
        .linkedin
        .refresh_access_token(&user.external_id)
        .await?;

    tracing::info!(
        external_id = %user.external_id,
        rotated = outcome.rotated,
        "Access token refreshed"
    );

    Ok(Json(RefreshResponse {
        ok: true,
        expires_in: outcome.expires_in,
        token_expires_at: outcome.token_expires_at,
    }))
}
