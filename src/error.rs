//! Error types shared across the auth flow.
//!
//! ERROR HANDLING
//! ==============
//! Auth Service failures are tagged values, never panics. The Session
//! Controller converts every `AuthError` into an `AuthOutcome` so nothing
//! escapes to the presentation layer.

/// Validation message when a required signup/login field is blank.
pub const MSG_ALL_FIELDS_MANDATORY: &str = "All fields are mandatory";
/// Validation message when an email fails the shape check.
pub const MSG_INVALID_EMAIL: &str = "Email must be in a valid format";
/// Validation message when a signup password is too short.
pub const MSG_PASSWORD_TOO_SHORT: &str = "Password must be at least 6 characters";

// =============================================================================
// AUTH ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("User with this email already exists")]
    Conflict,
    #[error("Incorrect password. Please try again.")]
    InvalidCredentials,
    #[error("New to this application? Sign up to create an account.")]
    UnknownUser,
    #[error("Invalid token")]
    InvalidToken,
}

/// Payload-free tag for [`AuthError`], for exhaustive matching by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    Validation,
    Conflict,
    InvalidCredentials,
    UnknownUser,
    InvalidToken,
}

impl AuthError {
    #[must_use]
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::Validation(_) => AuthErrorKind::Validation,
            Self::Conflict => AuthErrorKind::Conflict,
            Self::InvalidCredentials => AuthErrorKind::InvalidCredentials,
            Self::UnknownUser => AuthErrorKind::UnknownUser,
            Self::InvalidToken => AuthErrorKind::InvalidToken,
        }
    }

    pub(crate) fn validation(message: &str) -> Self {
        Self::Validation(message.to_owned())
    }
}

// =============================================================================
// STORAGE ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage payload is not valid JSON: {0}")]
    Serde(#[from] serde_json::Error),
}

// =============================================================================
// CONFIG ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown AUTH_TOKEN_BINDING: {0} (expected 'unbound' or 'bound')")]
    UnknownTokenBinding(String),
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
