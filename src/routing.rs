//! Auth-aware route resolution.
//!
//! SYSTEM CONTEXT
//! ==============
//! The history mechanism hands over a path; this decides which page is
//! shown for it. `/dashboard` needs a session, `/login` and `/signup` are
//! pointless with one, anything unknown falls back on auth status.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Dashboard,
}

impl Route {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Signup => "/signup",
            Self::Dashboard => "/dashboard",
        }
    }

    #[must_use]
    pub fn requires_auth(self) -> bool {
        matches!(self, Self::Dashboard)
    }
}

/// Page to render for `path` given the current auth status.
#[must_use]
pub fn resolve_route(path: &str, is_authenticated: bool) -> Route {
    // Signed in, every path lands on the dashboard; signed out, only the
    // signup page is reachable besides login.
    match (path, is_authenticated) {
        (_, true) => Route::Dashboard,
        ("/signup", false) => Route::Signup,
        (_, false) => Route::Login,
    }
}

/// True when rendering `path` means redirecting away from it.
#[must_use]
pub fn should_redirect(path: &str, is_authenticated: bool) -> bool {
    resolve_route(path, is_authenticated).path() != path
}

#[cfg(test)]
#[path = "routing_test.rs"]
mod tests;
