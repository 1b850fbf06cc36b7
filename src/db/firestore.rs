// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed user operations.
//!
//! Users live in the `users` collection keyed by their LinkedIn subject id.
//! Every write is a single document write, so Firestore's per-document
//! atomicity is all the consistency we need.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{ProfileUpdate, TokenUpdate, User, UserUpsert};
use crate::time_utils::format_utc_rfc3339;
use firestore::errors::FirestoreError;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a disconnected client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Reads ───────────────────────────────────────────────────

    /// Get a user by internal record id.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("id").eq(id)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(users.into_iter().next())
    }

    /// Get a user by LinkedIn subject id (the document id).
    pub async fn get_user_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(external_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Writes ──────────────────────────────────────────────────

    /// Record a login: create the user on first sight, otherwise update the
    /// login fields in place.
    ///
    /// The insert is create-only, so two racing first logins cannot both
    /// create the document; the loser falls through to the update. The update
    /// is field-masked and never touches `id` or `created_at`.
    pub async fn upsert_login(&self, login: UserUpsert) -> Result<User, AppError> {
        let client = self.get_client()?;
        let external_id = login.external_id.clone();
        let now = format_utc_rfc3339(chrono::Utc::now());

        let new_user = login
            .clone()
            .into_new_user(uuid::Uuid::new_v4().to_string(), &now);

        let inserted: Result<(), FirestoreError> = client
            .fluent()
            .insert()
            .into(collections::USERS)
            .document_id(&external_id)
            .object(&new_user)
            .execute()
            .await;

        match inserted {
            Ok(()) => {
                tracing::info!(external_id = %external_id, "Created user");
            }
            Err(FirestoreError::DataConflictError(_)) => {
                let mask = login.update_mask();
                // Masked fields come from the login; id/created_at are not in the mask.
                let _: () = client
                    .fluent()
                    .update()
                    .fields(mask)
                    .in_col(collections::USERS)
                    .document_id(&external_id)
                    .object(&new_user)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                tracing::info!(external_id = %external_id, "Updated user on login");
            }
            Err(e) => return Err(AppError::Database(e.to_string())),
        }

        self.get_user_by_external_id(&external_id)
            .await?
            .ok_or_else(|| {
                tracing::error!(external_id = %external_id, "User missing after upsert");
                AppError::Database("User missing after upsert".to_string())
            })
    }

    /// Apply an onboarding update. Returns `None` if the user does not exist.
    pub async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, AppError> {
        let Some(mut user) = self.get_user(id).await? else {
            return Ok(None);
        };
        update.apply_to(&mut user);

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(update.update_mask())
            .in_col(collections::USERS)
            .document_id(&user.external_id)
            .object(&user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(Some(user))
    }

    /// Store tokens from a refresh grant.
    pub async fn update_tokens(
        &self,
        external_id: &str,
        update: TokenUpdate,
    ) -> Result<User, AppError> {
        let mut user = self
            .get_user_by_external_id(external_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", external_id)))?;

        let mask = update.update_mask();
        update.apply_to(&mut user, &format_utc_rfc3339(chrono::Utc::now()));

        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .fields(mask)
            .in_col(collections::USERS)
            .document_id(external_id)
            .object(&user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(user)
    }
}
