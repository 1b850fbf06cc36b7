// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process user store for local development and tests.

use crate::error::AppError;
use crate::models::{ProfileUpdate, TokenUpdate, User, UserUpsert};
use crate::time_utils::format_utc_rfc3339;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Users keyed by LinkedIn subject id. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryDb {
    users: Arc<DashMap<String, User>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.value().clone()))
    }

    pub async fn get_user_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<User>, AppError> {
        Ok(self.users.get(external_id).map(|u| u.value().clone()))
    }

    /// Insert or update under the entry lock, so concurrent logins for the
    /// same identity serialize.
    pub async fn upsert_login(&self, login: UserUpsert) -> Result<User, AppError> {
        let now = format_utc_rfc3339(chrono::Utc::now());

        let user = match self.users.entry(login.external_id.clone()) {
            Entry::Occupied(mut entry) => {
                login.apply_to(entry.get_mut(), &now);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                let user = login.into_new_user(uuid::Uuid::new_v4().to_string(), &now);
                tracing::info!(external_id = %user.external_id, "Created user");
                entry.insert(user).value().clone()
            }
        };

        Ok(user)
    }

    pub async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, AppError> {
        Ok(self.users.iter_mut().find(|entry| entry.id == id).map(|mut entry| {
            update.apply_to(entry.value_mut());
            entry.value().clone()
        }))
    }

    pub async fn update_tokens(
        &self,
        external_id: &str,
        update: TokenUpdate,
    ) -> Result<User, AppError> {
        let mut user = self
            .users
            .get_mut(external_id)
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", external_id)))?;

        update.apply_to(user.value_mut(), &format_utc_rfc3339(chrono::Utc::now()));
        Ok(user.value().clone())
    }
}
