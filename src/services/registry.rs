//! User registry behind an injectable repository trait.
//!
//! ARCHITECTURE
//! ============
//! The Auth Service never owns user storage directly. It talks to a
//! `UserRepository`, so each test (or each running client) constructs its
//! own registry instead of sharing module-level state.
//!
//! Ids are handed out from a counter that only moves forward; a rejected
//! insert does not consume an id, and no id is ever reissued.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Full user record, including the password. Never leaves the service layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub full_name: String,
    pub email: String,
    pub password: String,
}

impl User {
    #[must_use]
    pub fn public_view(&self) -> PublicUser {
        PublicUser { id: self.id, full_name: self.full_name.clone(), email: self.email.clone() }
    }
}

/// User record with the password stripped. This is what gets persisted and
/// shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: u64,
    pub full_name: String,
    pub email: String,
}

/// Signup payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

pub trait UserRepository: Send + Sync {
    /// Exact, case-sensitive email lookup.
    fn find_by_email(&self, email: &str) -> Option<User>;

    /// Store `user` under a fresh id. Returns `None`, without consuming an
    /// id, if the email is already registered.
    fn insert(&self, user: NewUser) -> Option<User>;

    fn find_by_id(&self, id: u64) -> Option<User>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// IN-MEMORY REPOSITORY
// =============================================================================

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    inner: Mutex<RegistryInner>,
}

#[derive(Debug)]
struct RegistryInner {
    users: Vec<User>,
    next_id: u64,
}

impl Default for RegistryInner {
    fn default() -> Self {
        Self { users: Vec::new(), next_id: 1 }
    }
}

/// Account present in a freshly seeded registry.
pub const DEMO_FULL_NAME: &str = "Test User";
pub const DEMO_EMAIL: &str = "test@example.com";
pub const DEMO_PASSWORD: &str = "password123";

impl InMemoryUserRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding only the demo account (id 1).
    #[must_use]
    pub fn seeded() -> Self {
        let repo = Self::new();
        let _ = repo.insert(NewUser {
            full_name: DEMO_FULL_NAME.to_owned(),
            email: DEMO_EMAIL.to_owned(),
            password: DEMO_PASSWORD.to_owned(),
        });
        repo
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl UserRepository for InMemoryUserRepository {
    fn find_by_email(&self, email: &str) -> Option<User> {
        self.lock().users.iter().find(|u| u.email == email).cloned()
    }

    fn insert(&self, user: NewUser) -> Option<User> {
        let mut inner = self.lock();
        if inner.users.iter().any(|u| u.email == user.email) {
            return None;
        }
        let record = User { id: inner.next_id, full_name: user.full_name, email: user.email, password: user.password };
        inner.next_id += 1;
        inner.users.push(record.clone());
        Some(record)
    }

    fn find_by_id(&self, id: u64) -> Option<User> {
        self.lock().users.iter().find(|u| u.id == id).cloned()
    }

    fn len(&self) -> usize {
        self.lock().users.len()
    }
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
