//! Mock authentication authority.
//!
//! ARCHITECTURE
//! ============
//! `AuthApi` is the seam the Session Controller talks to. `MockAuthService`
//! implements it in-process over an injected `UserRepository`, sleeping for a
//! configured latency before each answer so callers see the same suspension
//! points a remote authority would impose. There is no failure mode besides
//! the tagged `AuthError`s: every call eventually resolves.
//!
//! TRADE-OFFS
//! ==========
//! Passwords are compared in plaintext and tokens are random strings, not
//! signed credentials. Under `TokenBinding::Unbound` any well-formed token
//! validates to the demo identity regardless of who obtained it; `Bound`
//! records issued tokens and resolves them to their owner instead.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::registry::{DEMO_EMAIL, DEMO_FULL_NAME, NewUser, PublicUser, User, UserRepository};
use super::token;
use crate::error::{AuthError, MSG_ALL_FIELDS_MANDATORY, MSG_INVALID_EMAIL, MSG_PASSWORD_TOO_SHORT};
use crate::validation::is_valid_email;
use crate::validation::schemas::PASSWORD_MIN_LENGTH;

pub const SIGNUP_SUCCESS_MESSAGE: &str = "Account created successfully";
pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful";

pub(crate) const DEFAULT_SIGNUP_LATENCY_MS: u64 = 1500;
pub(crate) const DEFAULT_LOGIN_LATENCY_MS: u64 = 1000;
pub(crate) const DEFAULT_VALIDATE_LATENCY_MS: u64 = 500;

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: PublicUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: PublicUser,
}

// =============================================================================
// TUNING
// =============================================================================

/// Simulated round-trip time per operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Latency {
    pub signup: Duration,
    pub login: Duration,
    pub validate_token: Duration,
}

impl Latency {
    pub const NONE: Self = Self { signup: Duration::ZERO, login: Duration::ZERO, validate_token: Duration::ZERO };

    #[must_use]
    pub fn from_millis(signup: u64, login: u64, validate_token: u64) -> Self {
        Self {
            signup: Duration::from_millis(signup),
            login: Duration::from_millis(login),
            validate_token: Duration::from_millis(validate_token),
        }
    }
}

impl Default for Latency {
    fn default() -> Self {
        Self::from_millis(DEFAULT_SIGNUP_LATENCY_MS, DEFAULT_LOGIN_LATENCY_MS, DEFAULT_VALIDATE_LATENCY_MS)
    }
}

/// How `validate_token` maps a token to a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenBinding {
    /// Any well-formed token resolves to the demo identity.
    #[default]
    Unbound,
    /// Tokens resolve to the user they were issued to; unissued tokens fail.
    Bound,
}

/// Identity returned for every valid token under [`TokenBinding::Unbound`].
#[must_use]
pub fn default_identity() -> PublicUser {
    PublicUser { id: 1, full_name: DEMO_FULL_NAME.to_owned(), email: DEMO_EMAIL.to_owned() }
}

// =============================================================================
// SEAM
// =============================================================================

#[async_trait::async_trait]
pub trait AuthApi: Send + Sync {
    async fn signup(&self, user: NewUser) -> Result<SignupResponse, AuthError>;

    async fn login(&self, credentials: LoginCredentials) -> Result<LoginResponse, AuthError>;

    async fn validate_token(&self, token: &str) -> Result<PublicUser, AuthError>;
}

// =============================================================================
// MOCK AUTHORITY
// =============================================================================

pub struct MockAuthService {
    users: Arc<dyn UserRepository>,
    latency: Latency,
    binding: TokenBinding,
    /// token -> user id. Only populated under `TokenBinding::Bound`.
    issued: Mutex<HashMap<String, u64>>,
}

impl MockAuthService {
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, latency: Latency, binding: TokenBinding) -> Self {
        Self { users, latency, binding, issued: Mutex::new(HashMap::new()) }
    }

    #[must_use]
    pub fn users(&self) -> &Arc<dyn UserRepository> {
        &self.users
    }

    fn issued(&self) -> std::sync::MutexGuard<'_, HashMap<String, u64>> {
        self.issued
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

async fn simulate_latency(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[async_trait::async_trait]
impl AuthApi for MockAuthService {
    async fn signup(&self, user: NewUser) -> Result<SignupResponse, AuthError> {
        simulate_latency(self.latency.signup).await;

        if is_blank(&user.full_name) || is_blank(&user.email) || is_blank(&user.password) {
            return Err(AuthError::validation(MSG_ALL_FIELDS_MANDATORY));
        }
        if !is_valid_email(&user.email) {
            return Err(AuthError::validation(MSG_INVALID_EMAIL));
        }
        if user.password.chars().count() < PASSWORD_MIN_LENGTH {
            return Err(AuthError::validation(MSG_PASSWORD_TOO_SHORT));
        }

        let created = self.users.insert(user).ok_or(AuthError::Conflict)?;
        tracing::debug!(user_id = created.id, "registered user");

        Ok(SignupResponse { message: SIGNUP_SUCCESS_MESSAGE.to_owned(), user: created.public_view() })
    }

    async fn login(&self, credentials: LoginCredentials) -> Result<LoginResponse, AuthError> {
        simulate_latency(self.latency.login).await;

        if is_blank(&credentials.email) || is_blank(&credentials.password) {
            return Err(AuthError::validation(MSG_ALL_FIELDS_MANDATORY));
        }
        if !is_valid_email(&credentials.email) {
            return Err(AuthError::validation(MSG_INVALID_EMAIL));
        }

        let user = self
            .users
            .find_by_email(&credentials.email)
            .ok_or(AuthError::UnknownUser)?;
        if user.password != credentials.password {
            return Err(AuthError::InvalidCredentials);
        }

        let token = token::generate_token();
        if self.binding == TokenBinding::Bound {
            self.issued().insert(token.clone(), user.id);
        }
        tracing::debug!(user_id = user.id, "issued session token");

        Ok(LoginResponse { message: LOGIN_SUCCESS_MESSAGE.to_owned(), token, user: user.public_view() })
    }

    async fn validate_token(&self, token: &str) -> Result<PublicUser, AuthError> {
        simulate_latency(self.latency.validate_token).await;

        if !token::is_well_formed(token) {
            return Err(AuthError::InvalidToken);
        }

        match self.binding {
            TokenBinding::Unbound => Ok(default_identity()),
            TokenBinding::Bound => {
                let user_id = self.issued().get(token).copied().ok_or(AuthError::InvalidToken)?;
                self.users
                    .find_by_id(user_id)
                    .as_ref()
                    .map(User::public_view)
                    .ok_or(AuthError::InvalidToken)
            }
        }
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
