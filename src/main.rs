// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! LinkedIn Login API Server
//!
//! Signs users in with LinkedIn, stores their profile, and issues a session
//! cookie for the profile endpoints.

use linkedin_login::{
    config::{Config, StoreBackend},
    db::{FirestoreDb, MemoryDb, UserStore},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting LinkedIn Login API");

    // One store handle for the life of the process
    let db = match config.store_backend {
        StoreBackend::Firestore => {
            UserStore::Firestore(FirestoreDb::new(&config.gcp_project_id).await?)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory user store; data is lost on restart");
            UserStore::Memory(MemoryDb::new())
        }
    };

    // Build shared state
    let state = Arc::new(AppState::new(config.clone(), db)?);
    tracing::info!(redirect_uri = %config.redirect_uri(), "LinkedIn client initialized");

    // Build router
    let app = linkedin_login::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("linkedin_login=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
