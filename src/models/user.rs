//! User model for storage and API.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::NormalizedProfile;

/// User record stored in the `users` collection.
///
/// The document ID is `external_id`; `id` is the internal record id carried
/// in session tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Internal record id (UUID, assigned on insert)
    pub id: String,
    /// LinkedIn subject identifier
    pub external_id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub experience: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub education: Option<Vec<serde_json::Value>>,
    /// Current LinkedIn access token (plaintext, short-lived)
    pub access_token: String,
    /// Refresh token envelope (see `services::cipher`)
    #[serde(default)]
    pub refresh_token_encrypted: Option<String>,
    /// Access token expiry (epoch millis)
    pub token_expires_at: i64,
    /// When the record was first inserted (RFC 3339)
    pub created_at: String,
    /// Last login or token refresh (RFC 3339)
    pub updated_at: String,
    /// Last upstream profile responses, kept for diagnostics only
    #[serde(default)]
    pub raw: Option<serde_json::Value>,
}

/// Mutable fields written on every login.
#[derive(Debug, Clone)]
pub struct UserUpsert {
    pub external_id: String,
    pub profile: NormalizedProfile,
    pub access_token: String,
    pub token_expires_at: i64,
    pub refresh_token_encrypted: Option<String>,
    pub raw: Option<serde_json::Value>,
}

impl UserUpsert {
    /// Build the record inserted when this identity logs in for the first time.
    pub fn into_new_user(self, id: String, now: &str) -> User {
        let p = self.profile;
        User {
            id,
            external_id: self.external_id,
            full_name: p.full_name,
            email: p.email,
            headline: p.headline,
            profile_url: p.profile_url,
            profile_picture: p.profile_picture,
            location: p.location,
            experience: p.experience,
            education: p.education,
            access_token: self.access_token,
            refresh_token_encrypted: self.refresh_token_encrypted,
            token_expires_at: self.token_expires_at,
            created_at: now.to_string(),
            updated_at: now.to_string(),
            raw: self.raw,
        }
    }

    /// Apply this login to an existing record. Known values overwrite, unknown
    /// ones leave the stored value alone; `id` and `created_at` never change.
    /// `raw` always describes this login, so it is replaced even when empty.
    pub fn apply_to(self, user: &mut User, now: &str) {
        let p = self.profile;
        overwrite(&mut user.full_name, p.full_name);
        overwrite(&mut user.email, p.email);
        overwrite(&mut user.headline, p.headline);
        overwrite(&mut user.profile_url, p.profile_url);
        overwrite(&mut user.profile_picture, p.profile_picture);
        overwrite(&mut user.location, p.location);
        overwrite(&mut user.experience, p.experience);
        overwrite(&mut user.education, p.education);
        overwrite(&mut user.refresh_token_encrypted, self.refresh_token_encrypted);
        user.raw = self.raw;
        user.access_token = self.access_token;
        user.token_expires_at = self.token_expires_at;
        user.updated_at = now.to_string();
    }

    /// Firestore field paths this login writes on an existing document.
    pub fn update_mask(&self) -> Vec<&'static str> {
        let p = &self.profile;
        let mut fields = vec!["access_token", "token_expires_at", "updated_at", "raw"];
        let optional = [
            ("full_name", p.full_name.is_some()),
            ("email", p.email.is_some()),
            ("headline", p.headline.is_some()),
            ("profile_url", p.profile_url.is_some()),
            ("profile_picture", p.profile_picture.is_some()),
            ("location", p.location.is_some()),
            ("experience", p.experience.is_some()),
            ("education", p.education.is_some()),
            ("refresh_token_encrypted", self.refresh_token_encrypted.is_some()),
        ];
        fields.extend(optional.iter().filter(|(_, set)| *set).map(|(name, _)| *name));
        fields
    }
}

fn overwrite<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Onboarding update: only the provided fields change.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(url)]
    pub profile_picture: Option<String>,
}

impl ProfileUpdate {
    /// Drop empty strings so they count as "not provided".
    pub fn normalized(self) -> Self {
        Self {
            email: self.email.filter(|s| !s.trim().is_empty()),
            profile_picture: self.profile_picture.filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.profile_picture.is_none()
    }

    pub fn apply_to(&self, user: &mut User) {
        overwrite(&mut user.email, self.email.clone());
        overwrite(&mut user.profile_picture, self.profile_picture.clone());
    }

    pub fn update_mask(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.email.is_some() {
            fields.push("email");
        }
        if self.profile_picture.is_some() {
            fields.push("profile_picture");
        }
        fields
    }
}

/// New tokens from a refresh grant.
#[derive(Debug, Clone)]
pub struct TokenUpdate {
    pub access_token: String,
    pub token_expires_at: i64,
    /// Set only when LinkedIn rotated the refresh token
    pub refresh_token_encrypted: Option<String>,
}

impl TokenUpdate {
    pub fn apply_to(self, user: &mut User, now: &str) {
        user.access_token = self.access_token;
        user.token_expires_at = self.token_expires_at;
        overwrite(&mut user.refresh_token_encrypted, self.refresh_token_encrypted);
        user.updated_at = now.to_string();
    }

    pub fn update_mask(&self) -> Vec<&'static str> {
        let mut fields = vec!["access_token", "token_expires_at", "updated_at"];
        if self.refresh_token_encrypted.is_some() {
            fields.push("refresh_token_encrypted");
        }
        fields
    }
}
