// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! LinkedIn login: OAuth 2.0 sign-in with LinkedIn, persisted user profiles,
//! and cookie-carried session tokens.
//!
//! This crate provides the backend for the login flow, the session-bound
//! profile endpoints, and on-demand access token refresh.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::UserStore;
use error::AppError;
use services::{LinkedInClient, LinkedInService, SessionCodec, TokenCipher};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: UserStore,
    pub linkedin: LinkedInService,
    pub sessions: SessionCodec,
}

impl AppState {
    /// Wire up services around an already-connected store.
    pub fn new(config: Config, db: UserStore) -> Result<Self, AppError> {
        let client = LinkedInClient::new(&config)?;
        let cipher = TokenCipher::new(&config.refresh_token_key);
        let linkedin = LinkedInService::new(client, db.clone(), cipher);
        let sessions = SessionCodec::new(&config.jwt_signing_key);

        Ok(Self {
            config,
            db,
            linkedin,
            sessions,
        })
    }
}
