//! Runtime configuration parsed from environment variables.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::services::auth::{
    DEFAULT_LOGIN_LATENCY_MS, DEFAULT_SIGNUP_LATENCY_MS, DEFAULT_VALIDATE_LATENCY_MS, Latency, TokenBinding,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub latency: Latency,
    pub token_binding: TokenBinding,
    /// Seed the registry with the demo account.
    pub seed_demo_user: bool,
    /// File backing the credential store. `None` keeps it in memory.
    pub store_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { latency: Latency::default(), token_binding: TokenBinding::default(), seed_demo_user: true, store_path: None }
    }
}

impl AppConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `AUTH_SIGNUP_LATENCY_MS`: default 1500
    /// - `AUTH_LOGIN_LATENCY_MS`: default 1000
    /// - `AUTH_VALIDATE_LATENCY_MS`: default 500
    /// - `AUTH_TOKEN_BINDING`: `unbound` (default) or `bound`
    /// - `AUTH_SEED_DEMO_USER`: default true
    /// - `AUTH_STORE_PATH`: unset means in-memory storage
    ///
    /// # Errors
    ///
    /// Returns an error if `AUTH_TOKEN_BINDING` holds an unknown value.
    pub fn from_env() -> Result<Self, ConfigError> {
        let latency = Latency::from_millis(
            env_parse("AUTH_SIGNUP_LATENCY_MS", DEFAULT_SIGNUP_LATENCY_MS),
            env_parse("AUTH_LOGIN_LATENCY_MS", DEFAULT_LOGIN_LATENCY_MS),
            env_parse("AUTH_VALIDATE_LATENCY_MS", DEFAULT_VALIDATE_LATENCY_MS),
        );
        let token_binding = parse_token_binding(std::env::var("AUTH_TOKEN_BINDING").ok().as_deref())?;
        let seed_demo_user = env_bool("AUTH_SEED_DEMO_USER").unwrap_or(true);
        let store_path = std::env::var("AUTH_STORE_PATH")
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self { latency, token_binding, seed_demo_user, store_path })
    }
}

pub fn parse_token_binding(raw: Option<&str>) -> Result<TokenBinding, ConfigError> {
    match raw.map(str::trim).unwrap_or("unbound") {
        "" | "unbound" => Ok(TokenBinding::Unbound),
        "bound" => Ok(TokenBinding::Bound),
        other => Err(ConfigError::UnknownTokenBinding(other.to_owned())),
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().and_then(|raw| parse_bool(&raw))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
