// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use httpmock::MockServer;
use linkedin_login::config::Config;
use linkedin_login::db::{FirestoreDb, MemoryDb, UserStore};
use linkedin_login::routes::create_router;
use linkedin_login::services::AuthUser;
use linkedin_login::AppState;
use std::sync::Arc;

/// Path the mock LinkedIn token endpoint is served on.
#[allow(dead_code)]
pub const TOKEN_PATH: &str = "/oauth/v2/accessToken";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Test config with every LinkedIn endpoint pointed at `server`.
#[allow(dead_code)]
pub fn test_config(server: &MockServer) -> Config {
    Config {
        linkedin_auth_url: server.url("/oauth/v2/authorization"),
        linkedin_token_url: server.url(TOKEN_PATH),
        linkedin_api_url: server.base_url(),
        ..Config::default()
    }
}

/// Create a test app backed by the in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(server: &MockServer) -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(test_config(server))
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let db = UserStore::Memory(MemoryDb::new());
    let state = Arc::new(AppState::new(config, db).expect("Failed to build app state"));
    (create_router(state.clone()), state)
}

/// `Cookie` header value carrying a valid session for `user`.
#[allow(dead_code)]
pub fn session_cookie(state: &AppState, user: &AuthUser) -> String {
    let token = state.sessions.sign_default(user).unwrap();
    format!("{}={}", state.config.session_cookie_name, token)
}

/// Unsigned identity token carrying `claims` as its payload.
#[allow(dead_code)]
pub fn fake_id_token(claims: serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}
