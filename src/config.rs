// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup; a `.env` file is honored for local
//! development.

use std::env;
use std::time::Duration;

/// Fallback cipher secret for local development only.
const DEV_REFRESH_TOKEN_KEY: &str = "dev_dev_dev_dev_dev_dev_dev_dev_!";

const DEFAULT_SCOPES: [&str; 4] = ["openid", "profile", "email", "w_member_social"];

/// Which document store backs the user collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// LinkedIn OAuth client ID (public)
    pub linkedin_client_id: String,
    /// Public origin of this service, used to build the OAuth redirect URI
    pub base_url: String,
    /// Scopes requested at authorization time
    pub scopes: Vec<String>,
    pub linkedin_auth_url: String,
    pub linkedin_token_url: String,
    /// Base of the LinkedIn REST API (`/v2/me`, `/v2/emailAddress`)
    pub linkedin_api_url: String,
    /// Timeout applied to every outbound LinkedIn call
    pub http_timeout: Duration,
    pub session_cookie_name: String,
    /// Where the browser lands after a successful login
    pub post_login_redirect: String,
    pub store_backend: StoreBackend,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,

    // --- Secrets ---
    /// LinkedIn OAuth client secret
    pub linkedin_client_secret: String,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// Secret the refresh-token cipher key is derived from
    pub refresh_token_key: String,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            linkedin_client_id: "test_client_id".to_string(),
            base_url: "http://localhost:8080".to_string(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            linkedin_auth_url: "https://www.linkedin.com/oauth/v2/authorization".to_string(),
            linkedin_token_url: "https://www.linkedin.com/oauth/v2/accessToken".to_string(),
            linkedin_api_url: "https://api.linkedin.com".to_string(),
            http_timeout: Duration::from_secs(10),
            session_cookie_name: "li_session".to_string(),
            post_login_redirect: "/profile".to_string(),
            store_backend: StoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            linkedin_client_secret: "test_secret".to_string(),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            refresh_token_key: "test_refresh_token_key_32_bytes!!".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let refresh_token_key = match env::var("REFRESH_TOKEN_ENCRYPTION_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!(
                    "REFRESH_TOKEN_ENCRYPTION_KEY not set; using insecure default for local dev"
                );
                DEV_REFRESH_TOKEN_KEY.to_string()
            }
        };

        let store_backend = match env::var("USER_STORE").as_deref() {
            Ok("memory") => StoreBackend::Memory,
            Ok("firestore") | Err(_) => StoreBackend::Firestore,
            Ok(_) => return Err(ConfigError::Invalid("USER_STORE")),
        };

        Ok(Self {
            linkedin_client_id: env::var("LINKEDIN_CLIENT_ID")
                .map_err(|_| ConfigError::Missing("LINKEDIN_CLIENT_ID"))?,
            base_url: env::var("BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            scopes: parse_scopes(env::var("LINKEDIN_SCOPES").ok().as_deref()),
            linkedin_auth_url: env::var("LINKEDIN_AUTH_URL").unwrap_or_else(|_| {
                "https://www.linkedin.com/oauth/v2/authorization".to_string()
            }),
            linkedin_token_url: env::var("LINKEDIN_TOKEN_URL").unwrap_or_else(|_| {
                "https://www.linkedin.com/oauth/v2/accessToken".to_string()
            }),
            linkedin_api_url: env::var("LINKEDIN_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://api.linkedin.com".to_string()),
            http_timeout: Duration::from_secs(
                env::var("LINKEDIN_HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            session_cookie_name: env::var("SESSION_COOKIE_NAME")
                .unwrap_or_else(|_| "li_session".to_string()),
            post_login_redirect: env::var("POST_LOGIN_REDIRECT")
                .unwrap_or_else(|_| "/profile".to_string()),
            store_backend,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),

            linkedin_client_secret: env::var("LINKEDIN_CLIENT_SECRET")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("LINKEDIN_CLIENT_SECRET"))?,
            jwt_signing_key: env::var("JWT_SECRET")
                .map_err(|_| ConfigError::Missing("JWT_SECRET"))?
                .into_bytes(),
            refresh_token_key,
        })
    }

    /// Redirect URI registered with LinkedIn for this deployment.
    pub fn redirect_uri(&self) -> String {
        format!("{}/api/auth/callback", self.base_url)
    }

    /// Cookies get the `Secure` attribute only when served over https.
    pub fn cookie_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Parse a comma-separated scope list, falling back to the default set.
fn parse_scopes(raw: Option<&str>) -> Vec<String> {
    let parsed: Vec<String> = raw
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if parsed.is_empty() {
        DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()
    } else {
        parsed
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("LINKEDIN_CLIENT_ID", "test_id");
        env::set_var("LINKEDIN_CLIENT_SECRET", " test_secret\n");
        env::set_var("JWT_SECRET", "test_jwt_key_32_bytes_minimum!!");
        env::set_var("BASE_URL", "https://login.example.com/");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.linkedin_client_id, "test_id");
        assert_eq!(config.linkedin_client_secret, "test_secret");
        assert_eq!(
            config.redirect_uri(),
            "https://login.example.com/api/auth/callback"
        );
        assert!(config.cookie_secure());
        assert_eq!(config.http_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_parse_scopes() {
        assert_eq!(
            parse_scopes(Some(" openid, ,profile ")),
            vec!["openid".to_string(), "profile".to_string()]
        );
        assert_eq!(parse_scopes(None), DEFAULT_SCOPES.to_vec());
        assert_eq!(parse_scopes(Some(",,")), DEFAULT_SCOPES.to_vec());
    }

    #[test]
    fn test_default_is_not_secure() {
        let config = Config::default();
        assert!(!config.cookie_secure());
        assert_eq!(config.redirect_uri(), "http://localhost:8080/api/auth/callback");
    }
}
