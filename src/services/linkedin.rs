// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! LinkedIn OAuth client and login orchestration.
//!
//! Handles:
//! - Authorization URL construction
//! - Authorization-code and refresh-token grants
//! - Profile and email fetches for the legacy profile shape
//! - Persisting the normalized user with its encrypted refresh token

use crate::config::Config;
use crate::db::UserStore;
use crate::error::AppError;
use crate::models::{TokenUpdate, User, UserUpsert};
use crate::services::cipher::TokenCipher;
use crate::services::profile::{
    decode_id_token, normalize, EmailAddressResponse, PrimaryProfile, ProfileSource,
};
use crate::time_utils::token_expiry_millis;
use serde::Deserialize;
use serde_json::Value;

const PROFILE_PATH: &str = "/v2/me";
const EMAIL_PATH: &str = "/v2/emailAddress?q=members&projection=(elements*(handle~))";

/// LinkedIn API client.
#[derive(Clone)]
pub struct LinkedInClient {
    http: reqwest::Client,
    auth_url: String,
    token_url: String,
    api_base_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scopes: Vec<String>,
}

impl LinkedInClient {
    /// Create a client from configuration. Every request is bounded by the
    /// configured timeout; a timeout surfaces as a LinkedIn API error.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))?;

        Ok(Self {
            http,
            auth_url: config.linkedin_auth_url.clone(),
            token_url: config.linkedin_token_url.clone(),
            api_base_url: config.linkedin_api_url.clone(),
            client_id: config.linkedin_client_id.clone(),
            client_secret: config.linkedin_client_secret.clone(),
            redirect_uri: config.redirect_uri(),
            scopes: config.scopes.clone(),
        })
    }

    /// Authorization endpoint URL carrying `state`.
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&state={}&scope={}",
            self.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(state),
            urlencoding::encode(&self.scopes.join(" "))
        )
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AppError> {
        self.post_token(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ])
        .await
    }

    /// Exchange a refresh token for a new access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        self.post_token(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ])
        .await
    }

    /// Raw `/v2/me` response.
    pub async fn get_profile(&self, access_token: &str) -> Result<Value, AppError> {
        let url = format!("{}{}", self.api_base_url, PROFILE_PATH);
        self.get_json(&url, access_token).await
    }

    /// Raw `/v2/emailAddress` response.
    pub async fn get_email(&self, access_token: &str) -> Result<Value, AppError> {
        let url = format!("{}{}", self.api_base_url, EMAIL_PATH);
        self.get_json(&url, access_token).await
    }

    async fn post_token(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::LinkedInApi(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "LinkedIn token request failed");
            return Err(AppError::LinkedInApi(format!(
                "Token request failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::LinkedInApi(format!("Failed to parse token response: {}", e)))
    }

    /// Generic GET request with JSON response.
    async fn get_json(&self, url: &str, access_token: &str) -> Result<Value, AppError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::LinkedInApi(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::LinkedInApi(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::LinkedInApi(format!("JSON parse error: {}", e)))
    }
}

/// Token endpoint response.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Access token lifetime in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Result of an on-demand access token refresh.
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub expires_in: Option<i64>,
    /// New expiry (epoch millis)
    pub token_expires_at: i64,
    /// Whether LinkedIn issued a new refresh token
    pub rotated: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// LinkedInService - login and refresh flows
// ─────────────────────────────────────────────────────────────────────────────

/// High-level service tying the LinkedIn client to storage and encryption.
#[derive(Clone)]
pub struct LinkedInService {
    client: LinkedInClient,
    db: UserStore,
    cipher: TokenCipher,
}

impl LinkedInService {
    pub fn new(client: LinkedInClient, db: UserStore, cipher: TokenCipher) -> Self {
        Self { client, db, cipher }
    }

    pub fn authorization_url(&self, state: &str) -> String {
        self.client.authorization_url(state)
    }

    // ─── OAuth Callback Handling ─────────────────────────────────────────────

    /// Exchange `code`, normalize the profile, and persist the user.
    ///
    /// Returns the stored record as re-read after the write.
    pub async fn complete_login(&self, code: &str) -> Result<User, AppError> {
        let tokens = self.client.exchange_code(code).await?;
        let now = chrono::Utc::now();

        let mut sources = Vec::with_capacity(2);
        let mut raw = None;

        match self.fetch_primary_profile(&tokens.access_token).await {
            Ok((source, raw_responses)) => {
                sources.push(source);
                raw = Some(raw_responses);
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Profile/email endpoints failed, falling back to identity token"
                );
            }
        }

        match tokens.id_token.as_deref().map(decode_id_token) {
            Some(Some(claims)) => sources.push(ProfileSource::IdentityToken(claims)),
            Some(None) => tracing::warn!("Failed to decode identity token"),
            None => {}
        }

        let profile = normalize(&sources);
        let external_id = profile.external_id.clone().ok_or_else(|| {
            AppError::LinkedInApi("No identity id from profile or identity token".to_string())
        })?;

        let refresh_token_encrypted = tokens
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(|t| self.cipher.encrypt(t))
            .transpose()?;

        let login = UserUpsert {
            external_id,
            profile,
            access_token: tokens.access_token,
            token_expires_at: token_expiry_millis(now, tokens.expires_in),
            refresh_token_encrypted,
            raw,
        };

        let user = self.db.upsert_login(login).await?;

        tracing::info!(
            user_id = %user.id,
            external_id = %user.external_id,
            "OAuth callback handled, user stored"
        );

        Ok(user)
    }

    /// Fetch the legacy profile and email concurrently; both must succeed.
    async fn fetch_primary_profile(
        &self,
        access_token: &str,
    ) -> Result<(ProfileSource, Value), AppError> {
        let (profile_raw, email_raw) = tokio::try_join!(
            self.client.get_profile(access_token),
            self.client.get_email(access_token),
        )?;

        let profile: PrimaryProfile = serde_json::from_value(profile_raw.clone())
            .map_err(|e| AppError::LinkedInApi(format!("Unexpected profile shape: {}", e)))?;
        let email: EmailAddressResponse = serde_json::from_value(email_raw.clone())
            .map_err(|e| AppError::LinkedInApi(format!("Unexpected email shape: {}", e)))?;

        let source = ProfileSource::Primary {
            profile,
            email: email.primary_email(),
        };
        let raw = serde_json::json!({ "profile": profile_raw, "email": email_raw });

        Ok((source, raw))
    }

    // ─── Token Refresh ───────────────────────────────────────────────────────

    /// Refresh the stored access token for `external_id`.
    ///
    /// Fails with `NotFound` before contacting LinkedIn if there is no stored
    /// refresh token or it cannot be decrypted.
    pub async fn refresh_access_token(&self, external_id: &str) -> Result<RefreshOutcome, AppError> {
        let envelope = self
            .db
            .get_user_by_external_id(external_id)
            .await?
            .and_then(|user| user.refresh_token_encrypted)
            .ok_or_else(|| AppError::NotFound("no refresh token".to_string()))?;

        let refresh_token = self.cipher.decrypt(&envelope).ok_or_else(|| {
            tracing::warn!(external_id, "Stored refresh token could not be decrypted");
            AppError::NotFound("refresh token could not be decrypted".to_string())
        })?;

        let tokens = self.client.refresh_token(&refresh_token).await?;
        let token_expires_at = token_expiry_millis(chrono::Utc::now(), tokens.expires_in);

        let rotated = tokens
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty() && *t != refresh_token)
            .map(|t| self.cipher.encrypt(t))
            .transpose()?;
        let was_rotated = rotated.is_some();

        self.db
            .update_tokens(
                external_id,
                TokenUpdate {
                    access_token: tokens.access_token,
                    token_expires_at,
                    refresh_token_encrypted: rotated,
                },
            )
            .await?;

        tracing::info!(external_id, rotated = was_rotated, "Access token refreshed");

        Ok(RefreshOutcome {
            expires_in: tokens.expires_in,
            token_expires_at,
            rotated: was_rotated,
        })
    }
}
