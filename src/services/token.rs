//! Opaque session token generation and shape checks.
//!
//! Tokens are `mock-jwt-token-` followed by lowercase base-36 characters.
//! The suffix comes from a thread-local RNG; it makes tokens unique per
//! login, not unguessable. A real authority would issue signed tokens.

use rand::Rng;

pub const TOKEN_PREFIX: &str = "mock-jwt-token-";
const SUFFIX_LEN: usize = 9;
const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[must_use]
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..SUFFIX_ALPHABET.len());
            SUFFIX_ALPHABET[idx] as char
        })
        .collect();
    format!("{TOKEN_PREFIX}{suffix}")
}

/// True when `token` has the prefix and a non-empty base-36 suffix.
#[must_use]
pub fn is_well_formed(token: &str) -> bool {
    token
        .strip_prefix(TOKEN_PREFIX)
        .is_some_and(|suffix| !suffix.is_empty() && suffix.bytes().all(|b| SUFFIX_ALPHABET.contains(&b)))
}

#[cfg(test)]
#[path = "token_test.rs"]
mod tests;
