//! Authority-side services consumed by the Session Controller.
//!
//! ARCHITECTURE
//! ============
//! `auth` owns the credential rules, `registry` owns user records and
//! `token` owns the token format. The controller only ever sees the
//! `AuthApi` trait.

pub mod auth;
pub mod registry;
pub mod token;
