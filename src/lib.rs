//! Client-side authentication flow over an in-process mock authority.
//!
//! ARCHITECTURE
//! ============
//! Leaf-first:
//! - `validation`: declarative per-field form rules and form state.
//! - `storage`: key-value storage port and the persisted credential pair.
//! - `services`: the mock authority (registry, tokens, signup/login/validate).
//! - `session`: the controller that ties the authority to storage and exposes
//!   login/signup/logout/restore plus loading/error state.
//! - `routing`: which page a path resolves to given the auth status.
//!
//! Presentation is out of scope; the `authflow` binary drives the whole flow
//! from a line-oriented shell.

pub mod config;
pub mod error;
pub mod routing;
pub mod services;
pub mod session;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use config::AppConfig;
use services::auth::MockAuthService;
use services::registry::InMemoryUserRepository;
use session::SessionController;
use storage::{CredentialStore, FileStorage, MemoryStorage, StoragePort};

/// Wire a controller from config: fresh registry, mock authority and the
/// configured storage backend.
#[must_use]
pub fn build_session(config: &AppConfig) -> SessionController {
    let users = if config.seed_demo_user {
        InMemoryUserRepository::seeded()
    } else {
        InMemoryUserRepository::new()
    };
    let api = MockAuthService::new(Arc::new(users), config.latency, config.token_binding);

    let storage: Arc<dyn StoragePort> = match &config.store_path {
        Some(path) => Arc::new(FileStorage::new(path.clone())),
        None => Arc::new(MemoryStorage::new()),
    };

    SessionController::new(Arc::new(api), CredentialStore::new(storage))
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
