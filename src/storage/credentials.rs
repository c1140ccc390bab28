//! Persisted token + user pair for the current session.
//!
//! Layout: `auth_token` holds the raw token, `user_data` the JSON public
//! user view. Nothing else (no expiry, no encryption) is stored.

use std::sync::Arc;

use super::StoragePort;
use crate::error::StorageError;
use crate::services::registry::PublicUser;

pub const TOKEN_KEY: &str = "auth_token";
pub const USER_KEY: &str = "user_data";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSession {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn StoragePort>,
}

impl CredentialStore {
    #[must_use]
    pub fn new(storage: Arc<dyn StoragePort>) -> Self {
        Self { storage }
    }

    pub fn save(&self, token: &str, user: &PublicUser) -> Result<(), StorageError> {
        let raw = serde_json::to_string(user)?;
        self.storage.set(TOKEN_KEY, token)?;
        self.storage.set(USER_KEY, &raw)
    }

    /// The persisted pair, or `None` if either half is missing or the user
    /// document does not parse. A partial or unreadable pair is wiped so it
    /// is not rediscovered on the next start.
    pub fn load(&self) -> Result<Option<StoredSession>, StorageError> {
        let token = self.storage.get(TOKEN_KEY)?;
        let raw = self.storage.get(USER_KEY)?;
        let (token, raw) = match (token, raw) {
            (None, None) => return Ok(None),
            (Some(token), Some(raw)) if !token.is_empty() => (token, raw),
            _ => {
                tracing::warn!("discarding incomplete stored session");
                self.clear()?;
                return Ok(None);
            }
        };
        match serde_json::from_str::<PublicUser>(&raw) {
            Ok(user) => Ok(Some(StoredSession { token, user })),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable stored user");
                self.clear()?;
                Ok(None)
            }
        }
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)
    }
}

#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;
