//! Session Controller: the client's single source of auth state.
//!
//! ARCHITECTURE
//! ============
//! The controller sits between the presentation layer and two collaborators:
//! the `AuthApi` authority and the `CredentialStore`. Every public operation
//! resolves to plain data (`AuthOutcome` / `SessionSnapshot`); authority
//! errors are folded into messages at this boundary.
//!
//! ```text
//! Unknown ──restore──▶ Checking ──▶ Authenticated(user) | Anonymous
//! Anonymous/Authenticated ──login/signup──▶ Checking ──▶ result or prior phase
//! Authenticated ──logout──▶ Anonymous
//! ```
//!
//! CONCURRENCY
//! ===========
//! At most one restore/login/signup is in flight. A second call while one is
//! pending is turned away immediately instead of racing the first one's
//! state writes. The state mutex is never held across an await.
//!
//! `logout` bumps a generation counter. A pending call that resolves after
//! a logout compares generations and drops its result, so a sign-out is
//! never undone by a late login or restore.
//!
//! ERROR HANDLING
//! ==============
//! A token that fails validation during restore is treated as an expired
//! session: the store is wiped and the user lands in `Anonymous` with no
//! error shown.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::error::AuthErrorKind;
use crate::services::auth::{AuthApi, LoginCredentials};
use crate::services::registry::{NewUser, PublicUser};
use crate::storage::CredentialStore;

pub const BUSY_MESSAGE: &str = "Another request is already in progress";
pub const SIGNED_OUT_MESSAGE: &str = "Signed out while the request was pending";

// =============================================================================
// STATE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Before the startup restore has run.
    Unknown,
    /// An authority call is pending.
    Checking,
    Authenticated(PublicUser),
    Anonymous,
}

/// Read-only view of the session for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub user: Option<PublicUser>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Result of a login or signup attempt. Always returned, never thrown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthOutcome {
    pub success: bool,
    pub message: String,
    /// Session token, on successful login only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip)]
    pub error_kind: Option<AuthErrorKind>,
}

impl AuthOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into(), token: None, error_kind: None }
    }

    fn failed(message: impl Into<String>, kind: Option<AuthErrorKind>) -> Self {
        Self { success: false, message: message.into(), token: None, error_kind: kind }
    }
}

struct SessionInner {
    phase: SessionPhase,
    /// Phase to fall back to if the pending call does not authenticate.
    resume: Option<SessionPhase>,
    error: Option<String>,
    /// Bumped by every logout.
    generation: u64,
}

// =============================================================================
// CONTROLLER
// =============================================================================

pub struct SessionController {
    api: Arc<dyn AuthApi>,
    store: CredentialStore,
    inner: Mutex<SessionInner>,
    in_flight: AtomicBool,
}

/// Held for the duration of one authority call. Releasing it reopens the
/// controller and, if the call never settled, puts the prior phase back.
struct Flight<'a> {
    owner: &'a SessionController,
    generation: u64,
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        let mut inner = self.owner.inner();
        if inner.phase == SessionPhase::Checking {
            inner.phase = inner.resume.take().unwrap_or(SessionPhase::Anonymous);
        }
        inner.resume = None;
        drop(inner);
        self.owner.in_flight.store(false, Ordering::Release);
    }
}

impl SessionController {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, store: CredentialStore) -> Self {
        Self {
            api,
            store,
            inner: Mutex::new(SessionInner {
                phase: SessionPhase::Unknown,
                resume: None,
                error: None,
                generation: 0,
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    fn inner(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the single in-flight slot and enter `Checking`. `None` if another
    /// call holds it.
    fn begin(&self) -> Option<Flight<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("auth call rejected: another call is in flight");
            return None;
        }
        let mut inner = self.inner();
        let prior = std::mem::replace(&mut inner.phase, SessionPhase::Checking);
        inner.resume = Some(prior);
        inner.error = None;
        Some(Flight { owner: self, generation: inner.generation })
    }

    fn settle(&self, phase: SessionPhase) {
        let mut inner = self.inner();
        inner.phase = phase;
        inner.resume = None;
    }

    fn fail(&self, message: &str) {
        let mut inner = self.inner();
        inner.phase = inner.resume.take().unwrap_or(SessionPhase::Anonymous);
        inner.error = Some(message.to_owned());
    }

    fn clear_store(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear stored credentials");
        }
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    /// Restore a persisted session at startup. Runs once; later calls only
    /// return the current snapshot.
    pub async fn restore_session(&self) -> SessionSnapshot {
        if self.phase() != SessionPhase::Unknown {
            return self.snapshot();
        }
        let Some(flight) = self.begin() else {
            return self.snapshot();
        };

        let stored = match self.store.load() {
            Ok(stored) => stored,
            Err(e) => {
                tracing::warn!(error = %e, "stored credentials unreadable");
                self.clear_store();
                None
            }
        };

        let Some(stored) = stored else {
            tracing::debug!("no stored session");
            self.settle(SessionPhase::Anonymous);
            return self.snapshot();
        };

        match self.api.validate_token(&stored.token).await {
            Ok(_) => {
                let mut inner = self.inner();
                if inner.generation == flight.generation {
                    tracing::info!(user_id = stored.user.id, "session restored");
                    inner.phase = SessionPhase::Authenticated(stored.user);
                    inner.resume = None;
                } else {
                    tracing::info!("logout during restore, discarding restored session");
                }
            }
            Err(e) => {
                tracing::info!(error = %e, "stored session rejected, signing out");
                self.clear_store();
                self.settle(SessionPhase::Anonymous);
            }
        }
        self.snapshot()
    }

    pub async fn login(&self, credentials: LoginCredentials) -> AuthOutcome {
        let Some(flight) = self.begin() else {
            return AuthOutcome::failed(BUSY_MESSAGE, None);
        };

        let response = match self.api.login(credentials).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), "login failed");
                let message = e.to_string();
                self.fail(&message);
                return AuthOutcome::failed(message, Some(e.kind()));
            }
        };

        // Held across the save so a concurrent logout cannot interleave.
        let mut inner = self.inner();
        if inner.generation != flight.generation {
            tracing::info!(user_id = response.user.id, "logout during login, discarding token");
            return AuthOutcome::failed(SIGNED_OUT_MESSAGE, None);
        }
        if let Err(e) = self.store.save(&response.token, &response.user) {
            tracing::warn!(error = %e, "failed to persist session");
            self.clear_store();
            let message = e.to_string();
            inner.phase = inner.resume.take().unwrap_or(SessionPhase::Anonymous);
            inner.error = Some(message.clone());
            return AuthOutcome::failed(message, None);
        }

        tracing::info!(user_id = response.user.id, "login succeeded");
        inner.phase = SessionPhase::Authenticated(response.user);
        inner.resume = None;
        drop(inner);
        AuthOutcome { token: Some(response.token), ..AuthOutcome::ok(response.message) }
    }

    /// Register an account. Does not sign the user in.
    pub async fn signup(&self, user: NewUser) -> AuthOutcome {
        let Some(_flight) = self.begin() else {
            return AuthOutcome::failed(BUSY_MESSAGE, None);
        };

        match self.api.signup(user).await {
            Ok(response) => {
                tracing::info!(user_id = response.user.id, "signup succeeded");
                let prior = self.inner().resume.take().unwrap_or(SessionPhase::Anonymous);
                self.settle(prior);
                AuthOutcome::ok(response.message)
            }
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), "signup failed");
                let message = e.to_string();
                self.fail(&message);
                AuthOutcome::failed(message, Some(e.kind()))
            }
        }
    }

    /// Forget the session locally. Never fails; storage errors are logged.
    /// A call still pending is superseded and will not sign the user back in.
    pub fn logout(&self) {
        let mut inner = self.inner();
        inner.generation += 1;
        self.clear_store();
        inner.phase = SessionPhase::Anonymous;
        inner.resume = None;
        inner.error = None;
        tracing::info!("logged out");
    }

    pub fn clear_error(&self) {
        self.inner().error = None;
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.inner().phase.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner();
        let user = match &inner.phase {
            SessionPhase::Authenticated(user) => Some(user.clone()),
            _ => None,
        };
        SessionSnapshot {
            is_authenticated: user.is_some(),
            user,
            loading: matches!(inner.phase, SessionPhase::Unknown | SessionPhase::Checking),
            error: inner.error.clone(),
        }
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.inner().phase, SessionPhase::Authenticated(_))
    }

    #[must_use]
    pub fn user(&self) -> Option<PublicUser> {
        self.snapshot().user
    }

    #[must_use]
    pub fn loading(&self) -> bool {
        self.snapshot().loading
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.inner().error.clone()
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
