use rand::Rng;

use super::*;
use crate::services::auth::{Latency, MockAuthService, TokenBinding};
use crate::services::registry::{DEMO_EMAIL, DEMO_PASSWORD, InMemoryUserRepository};
use crate::storage::credentials::{TOKEN_KEY, USER_KEY};
use crate::storage::{FileStorage, MemoryStorage, StoragePort};

struct Harness {
    storage: Arc<MemoryStorage>,
    controller: SessionController,
}

fn harness_with(latency: Latency, binding: TokenBinding) -> Harness {
    let storage = Arc::new(MemoryStorage::new());
    let api = Arc::new(MockAuthService::new(Arc::new(InMemoryUserRepository::seeded()), latency, binding));
    let controller = SessionController::new(api, CredentialStore::new(storage.clone()));
    Harness { storage, controller }
}

fn harness() -> Harness {
    harness_with(Latency::NONE, TokenBinding::Unbound)
}

fn creds(email: &str, password: &str) -> LoginCredentials {
    LoginCredentials { email: email.into(), password: password.into() }
}

fn jane() -> NewUser {
    NewUser { full_name: "Jane Doe".into(), email: "jane@x.com".into(), password: "secret1".into() }
}

// =============================================================================
// Initial state + restore
// =============================================================================

#[test]
fn starts_unknown_and_loading() {
    let h = harness();
    assert_eq!(h.controller.phase(), SessionPhase::Unknown);
    let snap = h.controller.snapshot();
    assert!(snap.loading);
    assert!(!snap.is_authenticated);
    assert_eq!(snap.user, None);
    assert_eq!(snap.error, None);
}

#[tokio::test]
async fn restore_without_stored_session_is_anonymous() {
    let h = harness();
    let snap = h.controller.restore_session().await;
    assert_eq!(h.controller.phase(), SessionPhase::Anonymous);
    assert!(!snap.loading);
    assert!(!snap.is_authenticated);
}

#[tokio::test]
async fn restore_with_valid_token_authenticates_stored_user() {
    let h = harness();
    let stored = PublicUser { id: 9, full_name: "Stored".into(), email: "s@x.com".into() };
    CredentialStore::new(h.storage.clone())
        .save("mock-jwt-token-abc123", &stored)
        .unwrap();

    let snap = h.controller.restore_session().await;
    assert!(snap.is_authenticated);
    assert_eq!(snap.user, Some(stored));
}

#[tokio::test]
async fn restore_with_malformed_token_clears_store_silently() {
    let h = harness();
    h.storage.set(TOKEN_KEY, "corrupted!!").unwrap();
    h.storage
        .set(USER_KEY, r#"{"id":1,"fullName":"Test User","email":"test@example.com"}"#)
        .unwrap();

    let snap = h.controller.restore_session().await;
    assert_eq!(h.controller.phase(), SessionPhase::Anonymous);
    assert_eq!(snap.error, None);
    assert_eq!(h.storage.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(h.storage.get(USER_KEY).unwrap(), None);
}

#[tokio::test]
async fn restore_with_unreadable_user_clears_stale_token() {
    let h = harness();
    h.storage.set(TOKEN_KEY, "mock-jwt-token-abc123").unwrap();
    h.storage.set(USER_KEY, "{garbage}").unwrap();

    let snap = h.controller.restore_session().await;
    assert!(!snap.is_authenticated);
    assert_eq!(snap.error, None);
    assert_eq!(h.storage.get(TOKEN_KEY).unwrap(), None);
    assert_eq!(h.storage.get(USER_KEY).unwrap(), None);
}

#[tokio::test]
async fn corrupt_store_file_is_reset_and_login_still_persists() {
    let suffix: u64 = rand::rng().random();
    let dir = std::env::temp_dir().join(format!("authflow-session-{suffix:016x}"));
    let path = dir.join("session.json");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(&path, "{not json").unwrap();

    let storage: Arc<dyn StoragePort> = Arc::new(FileStorage::new(&path));
    let api = Arc::new(MockAuthService::new(
        Arc::new(InMemoryUserRepository::seeded()),
        Latency::NONE,
        TokenBinding::Unbound,
    ));
    let controller = SessionController::new(api, CredentialStore::new(storage));

    let snap = controller.restore_session().await;
    assert!(!snap.is_authenticated);
    assert_eq!(snap.error, None);

    let outcome = controller.login(creds(DEMO_EMAIL, DEMO_PASSWORD)).await;
    assert!(outcome.success, "{}", outcome.message);
    let reopened = FileStorage::new(&path);
    assert_eq!(reopened.get(TOKEN_KEY).unwrap(), outcome.token);

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn restore_with_bound_policy_rejects_unissued_token() {
    let h = harness_with(Latency::NONE, TokenBinding::Bound);
    let stored = PublicUser { id: 1, full_name: "Test User".into(), email: DEMO_EMAIL.into() };
    CredentialStore::new(h.storage.clone())
        .save("mock-jwt-token-stale", &stored)
        .unwrap();

    let snap = h.controller.restore_session().await;
    assert!(!snap.is_authenticated);
    assert_eq!(h.storage.get(TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn restore_only_runs_once() {
    let h = harness();
    h.controller.restore_session().await;
    h.controller.login(creds(DEMO_EMAIL, DEMO_PASSWORD)).await;
    h.storage.set(TOKEN_KEY, "corrupted!!").unwrap();

    let snap = h.controller.restore_session().await;
    assert!(snap.is_authenticated);
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn login_success_persists_and_authenticates() {
    let h = harness();
    h.controller.restore_session().await;

    let outcome = h.controller.login(creds(DEMO_EMAIL, DEMO_PASSWORD)).await;
    assert!(outcome.success);
    assert_eq!(outcome.message, "Login successful");
    let token = outcome.token.unwrap();
    assert!(!token.is_empty());

    assert!(h.controller.is_authenticated());
    assert_eq!(h.controller.user().unwrap().email, DEMO_EMAIL);
    assert!(!h.controller.loading());
    assert_eq!(h.storage.get(TOKEN_KEY).unwrap(), Some(token));
}

#[tokio::test]
async fn login_failure_sets_error_and_stays_anonymous() {
    let h = harness();
    h.controller.restore_session().await;

    let outcome = h.controller.login(creds(DEMO_EMAIL, "wrong-pass")).await;
    assert!(!outcome.success);
    assert_eq!(outcome.error_kind, Some(AuthErrorKind::InvalidCredentials));
    assert_eq!(outcome.message, "Incorrect password. Please try again.");
    assert_eq!(h.controller.error().as_deref(), Some("Incorrect password. Please try again."));
    assert_eq!(h.controller.phase(), SessionPhase::Anonymous);
    assert_eq!(h.storage.get(TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn login_unknown_user_is_tagged() {
    let h = harness();
    h.controller.restore_session().await;
    let outcome = h.controller.login(creds("ghost@x.com", "whatever")).await;
    assert_eq!(outcome.error_kind, Some(AuthErrorKind::UnknownUser));
}

#[tokio::test]
async fn failed_login_while_authenticated_keeps_session() {
    let h = harness();
    h.controller.restore_session().await;
    h.controller.login(creds(DEMO_EMAIL, DEMO_PASSWORD)).await;

    let outcome = h.controller.login(creds(DEMO_EMAIL, "wrong-pass")).await;
    assert!(!outcome.success);
    assert!(h.controller.is_authenticated());
    assert!(h.controller.error().is_some());
}

#[tokio::test]
async fn next_attempt_clears_previous_error() {
    let h = harness();
    h.controller.restore_session().await;
    h.controller.login(creds(DEMO_EMAIL, "wrong-pass")).await;
    assert!(h.controller.error().is_some());

    h.controller.login(creds(DEMO_EMAIL, DEMO_PASSWORD)).await;
    assert_eq!(h.controller.error(), None);
}

#[tokio::test(start_paused = true)]
async fn second_login_while_pending_is_rejected() {
    let h = harness_with(Latency::from_millis(0, 1000, 0), TokenBinding::Unbound);
    h.controller.restore_session().await;

    let (first, second) = tokio::join!(
        h.controller.login(creds(DEMO_EMAIL, DEMO_PASSWORD)),
        h.controller.login(creds(DEMO_EMAIL, DEMO_PASSWORD)),
    );
    assert!(first.success);
    assert!(!second.success);
    assert_eq!(second.message, BUSY_MESSAGE);
    assert!(h.controller.is_authenticated());

    let third = h.controller.login(creds(DEMO_EMAIL, DEMO_PASSWORD)).await;
    assert!(third.success);
}

#[tokio::test(start_paused = true)]
async fn loading_is_visible_while_login_pending() {
    let h = harness_with(Latency::from_millis(0, 1000, 0), TokenBinding::Unbound);
    h.controller.restore_session().await;

    let login = h.controller.login(creds(DEMO_EMAIL, DEMO_PASSWORD));
    let probe = async {
        tokio::task::yield_now().await;
        h.controller.snapshot()
    };
    let (outcome, during) = tokio::join!(login, probe);
    assert!(during.loading);
    assert!(!during.is_authenticated);
    assert!(outcome.success);
    assert!(!h.controller.loading());
}

#[tokio::test(start_paused = true)]
async fn logout_while_login_pending_discards_the_login() {
    let h = harness_with(Latency::from_millis(0, 1000, 0), TokenBinding::Unbound);
    h.controller.restore_session().await;

    let login = h.controller.login(creds(DEMO_EMAIL, DEMO_PASSWORD));
    let sign_out = async {
        tokio::task::yield_now().await;
        h.controller.logout();
    };
    let (outcome, ()) = tokio::join!(login, sign_out);

    assert!(!outcome.success);
    assert_eq!(outcome.message, SIGNED_OUT_MESSAGE);
    assert_eq!(outcome.token, None);
    assert_eq!(h.controller.phase(), SessionPhase::Anonymous);
    assert_eq!(h.storage.get(TOKEN_KEY).unwrap(), None);

    let retry = h.controller.login(creds(DEMO_EMAIL, DEMO_PASSWORD)).await;
    assert!(retry.success);
}

#[tokio::test(start_paused = true)]
async fn logout_while_restore_pending_stays_signed_out() {
    let h = harness_with(Latency::from_millis(0, 0, 500), TokenBinding::Unbound);
    let stored = PublicUser { id: 9, full_name: "Stored".into(), email: "s@x.com".into() };
    CredentialStore::new(h.storage.clone())
        .save("mock-jwt-token-abc123", &stored)
        .unwrap();

    let restore = h.controller.restore_session();
    let sign_out = async {
        tokio::task::yield_now().await;
        h.controller.logout();
    };
    let (snap, ()) = tokio::join!(restore, sign_out);

    assert!(!snap.is_authenticated);
    assert_eq!(h.controller.phase(), SessionPhase::Anonymous);
    assert_eq!(h.storage.get(TOKEN_KEY).unwrap(), None);
}

// =============================================================================
// Signup
// =============================================================================

#[tokio::test]
async fn signup_then_login_scenario() {
    let h = harness();
    h.controller.restore_session().await;

    let signed_up = h.controller.signup(jane()).await;
    assert!(signed_up.success);
    assert_eq!(signed_up.message, "Account created successfully");
    assert!(!h.controller.is_authenticated());
    assert_eq!(h.storage.get(TOKEN_KEY).unwrap(), None);

    let logged_in = h.controller.login(creds("jane@x.com", "secret1")).await;
    assert!(logged_in.success);
    assert!(logged_in.token.is_some_and(|t| !t.is_empty()));
    assert_eq!(h.controller.user().unwrap().full_name, "Jane Doe");
}

#[tokio::test]
async fn signup_conflict_sets_error() {
    let h = harness();
    h.controller.restore_session().await;
    h.controller.signup(jane()).await;

    let outcome = h.controller.signup(jane()).await;
    assert!(!outcome.success);
    assert_eq!(outcome.error_kind, Some(AuthErrorKind::Conflict));
    assert_eq!(h.controller.error().as_deref(), Some("User with this email already exists"));
    assert_eq!(h.controller.phase(), SessionPhase::Anonymous);
}

// =============================================================================
// Logout + errors
// =============================================================================

#[tokio::test]
async fn logout_clears_store_and_state() {
    let h = harness();
    h.controller.restore_session().await;
    h.controller.login(creds(DEMO_EMAIL, DEMO_PASSWORD)).await;

    h.controller.logout();
    assert!(!h.controller.is_authenticated());
    assert_eq!(h.controller.user(), None);
    assert_eq!(CredentialStore::new(h.storage.clone()).load().unwrap(), None);
}

#[tokio::test]
async fn logout_clears_error() {
    let h = harness();
    h.controller.restore_session().await;
    h.controller.login(creds(DEMO_EMAIL, "wrong-pass")).await;
    h.controller.logout();
    assert_eq!(h.controller.error(), None);
}

#[tokio::test]
async fn clear_error_only_touches_error() {
    let h = harness();
    h.controller.restore_session().await;
    h.controller.login(creds("nobody@x.com", "pw")).await;

    h.controller.clear_error();
    assert_eq!(h.controller.error(), None);
    assert_eq!(h.controller.phase(), SessionPhase::Anonymous);
}

#[tokio::test]
async fn session_survives_controller_restart() {
    let storage = Arc::new(MemoryStorage::new());
    let repo = Arc::new(InMemoryUserRepository::seeded());
    let api: Arc<dyn AuthApi> = Arc::new(MockAuthService::new(repo, Latency::NONE, TokenBinding::Unbound));

    let first = SessionController::new(api.clone(), CredentialStore::new(storage.clone()));
    first.restore_session().await;
    first.login(creds(DEMO_EMAIL, DEMO_PASSWORD)).await;

    let second = SessionController::new(api, CredentialStore::new(storage));
    let snap = second.restore_session().await;
    assert!(snap.is_authenticated);
    assert_eq!(snap.user.unwrap().email, DEMO_EMAIL);
}

#[test]
fn snapshot_serializes_camel_case() {
    let h = harness();
    let json = serde_json::to_value(h.controller.snapshot()).unwrap();
    assert_eq!(json["isAuthenticated"], false);
    assert_eq!(json["loading"], true);
    assert!(json["user"].is_null());
}
