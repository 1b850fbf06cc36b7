// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Signed session tokens (HS256 JWT).
//!
//! There is no server-side revocation: a token stays valid until it expires,
//! so logout only clears the client's cookie.

use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Default session lifetime.
pub const SESSION_TTL_DAYS: i64 = 7;

/// Authenticated user carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// Internal record id
    pub user_id: String,
    /// LinkedIn subject identifier
    pub external_id: String,
    pub email: Option<String>,
}

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject (internal record id)
    sub: String,
    external_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    /// Issued at (Unix timestamp)
    iat: i64,
    /// Expiration time (Unix timestamp)
    exp: i64,
}

/// Signs and verifies session tokens with a symmetric secret.
#[derive(Clone)]
pub struct SessionCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionCodec {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Sign a session for `user` that expires after `ttl`.
    pub fn sign(&self, user: &AuthUser, ttl: Duration) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user.user_id.clone(),
            external_id: user.external_id.clone(),
            email: user.email.clone(),
            iat: now,
            exp: now + ttl.num_seconds(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))
    }

    /// Sign a session with the default lifetime.
    pub fn sign_default(&self, user: &AuthUser) -> Result<String, AppError> {
        self.sign(user, Duration::days(SESSION_TTL_DAYS))
    }

    /// Verify signature and expiry. Every failure collapses to `None`.
    pub fn verify(&self, token: &str) -> Option<AuthUser> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).ok()?;
        Some(AuthUser {
            user_id: data.claims.sub,
            external_id: data.claims.external_id,
            email: data.claims.email,
        })
    }
}
