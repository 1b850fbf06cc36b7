//! Database layer (Firestore, or an in-process map for development).

pub mod firestore;
pub mod memory;

pub use self::firestore::FirestoreDb;
pub use self::memory::MemoryDb;

use crate::error::AppError;
use crate::models::{ProfileUpdate, TokenUpdate, User, UserUpsert};

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
}

/// Handle to the user collection, created once at startup and cloned into
/// every request.
#[derive(Clone)]
pub enum UserStore {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl UserStore {
    /// Look up a user by internal record id.
    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        match self {
            UserStore::Firestore(db) => db.get_user(id).await,
            UserStore::Memory(db) => db.get_user(id).await,
        }
    }

    /// Look up a user by LinkedIn subject id.
    pub async fn get_user_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<User>, AppError> {
        match self {
            UserStore::Firestore(db) => db.get_user_by_external_id(external_id).await,
            UserStore::Memory(db) => db.get_user_by_external_id(external_id).await,
        }
    }

    /// Atomically create or update the record for a login and return it.
    pub async fn upsert_login(&self, login: UserUpsert) -> Result<User, AppError> {
        match self {
            UserStore::Firestore(db) => db.upsert_login(login).await,
            UserStore::Memory(db) => db.upsert_login(login).await,
        }
    }

    /// Partial profile update; `None` if the user does not exist.
    pub async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<User>, AppError> {
        match self {
            UserStore::Firestore(db) => db.update_profile(id, update).await,
            UserStore::Memory(db) => db.update_profile(id, update).await,
        }
    }

    /// Store a refreshed access token (and a rotated refresh token, if any).
    pub async fn update_tokens(
        &self,
        external_id: &str,
        update: TokenUpdate,
    ) -> Result<User, AppError> {
        match self {
            UserStore::Firestore(db) => db.update_tokens(external_id, update).await,
            UserStore::Memory(db) => db.update_tokens(external_id, update).await,
        }
    }
}
