//! End-to-end lifecycle tests composing the controller, reducer, writer
//! funnel, and mocks.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use sessionkit_auth::mocks::{MockAuthGateway, MockCredentialStore};
use sessionkit_auth::{
    LoginRequest, ProfileUpdate, PasswordChange, SessionAction, SessionController, SessionError,
    SessionEvent, SessionPhase, User, UserRole,
};
use std::sync::Arc;
use std::time::Duration;

fn rig() -> (
    Arc<SessionController<MockAuthGateway>>,
    MockAuthGateway,
    MockCredentialStore,
) {
    let gateway = MockAuthGateway::new();
    let store = MockCredentialStore::new();
    let controller = Arc::new(SessionController::new(gateway.clone(), store.clone()));
    (controller, gateway, store)
}

fn creds() -> LoginRequest {
    LoginRequest {
        username: "alice".to_string(),
        password: "secret1".to_string(),
    }
}

fn bob() -> User {
    User {
        id: "9".to_string(),
        email: "b@x.com".to_string(),
        display_name: Some("Bob".to_string()),
        role: UserRole::User,
        created_at: None,
        updated_at: None,
    }
}

/// Wait until the session reports a login in flight.
async fn wait_for_loading(controller: &SessionController<MockAuthGateway>) {
    for _ in 0..100 {
        if controller.session().await.is_loading {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("login never entered flight");
}

// ═══════════════════════════════════════════════════════════════════════
// Login / register
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn login_populates_state_and_store() {
    let (controller, _, store) = rig();

    let user = controller.login(creds()).await.unwrap();
    assert_eq!(user.id, "1");

    let session = controller.session().await;
    assert!(session.is_authenticated());
    assert_eq!(session.user.as_ref().unwrap().id, "1");
    assert_eq!(session.user.as_ref().unwrap().email, "a@x.com");
    assert_eq!(session.access_token.as_deref(), Some("tok1"));
    assert_eq!(session.refresh_token.as_deref(), Some("ref1"));
    assert_eq!(session.phase, SessionPhase::Authenticated);
    assert!(!session.is_loading);
    assert!(session.error.is_none());

    // Storage was written before login() returned
    assert_eq!(store.access_token(), Some("tok1".to_string()));
    assert_eq!(store.refresh_token(), Some("ref1".to_string()));
    assert_eq!(store.stored_user().unwrap().id, "1");
}

#[tokio::test]
async fn login_with_invalid_credentials_sets_inline_error() {
    let (controller, gateway, store) = rig();
    gateway.set_login_result(Err(SessionError::InvalidCredentials));

    let err = controller.login(creds()).await.unwrap_err();
    assert_eq!(err, SessionError::InvalidCredentials);

    let session = controller.session().await;
    assert!(!session.is_authenticated());
    assert_eq!(session.error.as_deref(), Some("Invalid username or password"));
    assert_eq!(session.phase, SessionPhase::Error);
    assert!(store.is_empty());
}

#[tokio::test]
async fn register_signs_the_new_account_in() {
    let (controller, _, store) = rig();

    let user = controller
        .register(sessionkit_auth::RegisterRequest {
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password: "secret1".to_string(),
            display_name: Some("Alice".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(user.id, "1");
    assert!(controller.session().await.is_authenticated());
    assert_eq!(store.access_token(), Some("tok1".to_string()));
}

#[tokio::test]
async fn failed_login_attempt_clears_previous_error_while_in_flight() {
    let (controller, gateway, _) = rig();
    gateway.set_login_result(Err(SessionError::InvalidCredentials));
    let _ = controller.login(creds()).await;
    assert!(controller.session().await.error.is_some());

    gateway.set_login_result(Ok(MockAuthGateway::sample_payload()));
    controller.login(creds()).await.unwrap();
    assert!(controller.session().await.error.is_none());
}

// ═══════════════════════════════════════════════════════════════════════
// Logout
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn logout_ends_anonymous_regardless_of_network_outcome() {
    let outcomes = [
        Ok(()),
        Err(SessionError::Network("connection reset".to_string())),
        Err(SessionError::Server { status: 500 }),
    ];

    for outcome in outcomes {
        let (controller, gateway, store) = rig();
        controller.login(creds()).await.unwrap();
        gateway.set_logout_result(outcome);

        let mut handle = controller.logout().await;

        // Cleared locally before the server round-trip settles
        let session = controller.session().await;
        assert!(!session.is_authenticated());
        assert!(session.tokens().is_none());
        assert!(store.is_empty());

        handle.wait().await;
        assert_eq!(gateway.logout_calls(), 1);

        // The outcome never surfaces
        let session = controller.session().await;
        assert!(session.error.is_none());
        assert!(!session.is_authenticated());
    }
}

#[tokio::test]
async fn logout_during_login_wins() {
    let (controller, gateway, store) = rig();

    let guard = gateway.pause_logins().await;
    let login = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.login(creds()).await })
    };
    wait_for_loading(&controller).await;

    // Logout while the login is suspended at the network boundary
    let mut handle = controller.logout().await;
    assert!(!controller.session().await.is_authenticated());

    // Now let the login resolve; its success is stale and must not
    // resurrect the session
    drop(guard);
    login.await.unwrap().unwrap();
    handle.wait().await;

    let session = controller.session().await;
    assert!(!session.is_authenticated());
    assert!(session.tokens().is_none());
    assert!(store.is_empty());
    assert_eq!(store.save_calls(), 0);
}

// ═══════════════════════════════════════════════════════════════════════
// Restore
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn restore_trusts_stored_record_without_network() {
    let gateway = MockAuthGateway::new();
    let store = MockCredentialStore::new();
    store.set_tokens(Some("tok1"), Some("ref1"));
    store.set_user(&MockAuthGateway::sample_user());
    let controller = SessionController::new(gateway.clone(), store);

    controller.restore_session().await;

    let session = controller.session().await;
    assert!(session.is_authenticated());
    assert_eq!(session.user.unwrap().id, "1");
    assert_eq!(session.access_token.as_deref(), Some("tok1"));
    assert_eq!(gateway.login_calls(), 0);
    assert_eq!(gateway.refresh_calls(), 0);
}

#[tokio::test]
async fn restore_with_corrupt_user_record_degrades_silently() {
    let store = MockCredentialStore::new();
    store.set_tokens(Some("tok1"), Some("ref1"));
    store.set_raw_user("{definitely not json");
    let controller = SessionController::new(MockAuthGateway::new(), store.clone());

    controller.restore_session().await;

    assert!(!controller.session().await.is_authenticated());
    assert!(store.is_empty());
}

#[tokio::test]
async fn restore_with_partial_record_tears_down() {
    let store = MockCredentialStore::new();
    // Access token present, refresh token missing
    store.set_tokens(Some("tok1"), None);
    store.set_user(&MockAuthGateway::sample_user());
    let controller = SessionController::new(MockAuthGateway::new(), store.clone());

    controller.restore_session().await;

    assert!(!controller.session().await.is_authenticated());
    assert!(store.is_empty());
    assert_eq!(store.clear_calls(), 1);
}

#[tokio::test]
async fn restore_in_progress_is_superseded_by_login() {
    let gateway = MockAuthGateway::new();
    let store = MockCredentialStore::new();
    store.set_tokens(Some("tokOld"), Some("refOld"));
    store.set_user(&bob());
    let controller = Arc::new(SessionController::new(gateway, store.clone()));

    // Restore blocks while reading storage
    let guard = store.pause_loads().await;
    let restore = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.restore_session().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    // An explicit login starts (and commits) while the restore is stuck
    let login = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.login(creds()).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    drop(guard);
    restore.await.unwrap();
    login.await.unwrap().unwrap();

    // The explicit call's result wins
    let session = controller.session().await;
    assert_eq!(session.user.unwrap().id, "1");
    assert_eq!(session.access_token.as_deref(), Some("tok1"));
    assert_eq!(store.access_token(), Some("tok1".to_string()));
}

// ═══════════════════════════════════════════════════════════════════════
// Profile & password
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn failed_profile_update_keeps_prior_data_and_sets_error() {
    let (controller, gateway, store) = rig();
    controller.login(creds()).await.unwrap();
    gateway.set_profile_result(Err(SessionError::Validation {
        field: "displayName".to_string(),
        message: "too long".to_string(),
    }));

    let err = controller
        .update_profile(ProfileUpdate {
            display_name: Some("A".repeat(300)),
            avatar: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Validation { .. }));

    let session = controller.session().await;
    assert!(session.is_authenticated());
    assert_eq!(session.user.as_ref().unwrap().display_name.as_deref(), Some("Alice"));
    assert_eq!(session.error.as_deref(), Some("displayName: too long"));
    assert_eq!(session.phase, SessionPhase::Authenticated);

    // Storage still holds the pre-update record
    assert_eq!(store.stored_user().unwrap().display_name.as_deref(), Some("Alice"));
}

#[tokio::test]
async fn profile_update_merges_user_and_persists() {
    let (controller, gateway, store) = rig();
    controller.login(creds()).await.unwrap();

    let mut updated = MockAuthGateway::sample_user();
    updated.display_name = Some("Alicia".to_string());
    gateway.set_profile_result(Ok(updated));

    let user = controller
        .update_profile(ProfileUpdate {
            display_name: Some("Alicia".to_string()),
            avatar: None,
        })
        .await
        .unwrap();
    assert_eq!(user.display_name.as_deref(), Some("Alicia"));

    let session = controller.session().await;
    assert_eq!(session.user.unwrap().display_name.as_deref(), Some("Alicia"));
    // Tokens survive a profile update
    assert_eq!(session.access_token.as_deref(), Some("tok1"));
    assert_eq!(store.stored_user().unwrap().display_name.as_deref(), Some("Alicia"));
    assert_eq!(store.access_token(), Some("tok1".to_string()));
}

#[tokio::test]
async fn profile_update_without_session_is_rejected() {
    let (controller, _, _) = rig();
    let err = controller.update_profile(ProfileUpdate::default()).await.unwrap_err();
    assert_eq!(err, SessionError::AuthorizationExpired);
}

#[tokio::test]
async fn wrong_current_password_keeps_session_with_error() {
    let (controller, gateway, _) = rig();
    controller.login(creds()).await.unwrap();
    gateway.set_password_result(Err(SessionError::InvalidCredentials));

    let err = controller
        .change_password(PasswordChange {
            current_password: "wrong".to_string(),
            new_password: "secret2".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err, SessionError::InvalidCredentials);

    let session = controller.session().await;
    assert!(session.is_authenticated());
    assert_eq!(session.error.as_deref(), Some("Invalid username or password"));
}

#[tokio::test]
async fn password_change_succeeds_without_touching_credentials() {
    let (controller, _, store) = rig();
    controller.login(creds()).await.unwrap();

    controller
        .change_password(PasswordChange {
            current_password: "secret1".to_string(),
            new_password: "secret2".to_string(),
        })
        .await
        .unwrap();

    let session = controller.session().await;
    assert!(session.is_authenticated());
    assert!(session.error.is_none());
    assert_eq!(store.access_token(), Some("tok1".to_string()));
}

// ═══════════════════════════════════════════════════════════════════════
// Refresh & teardown
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn concurrent_refreshes_are_single_flight() {
    let (controller, gateway, store) = rig();
    controller.login(creds()).await.unwrap();

    let guard = gateway.pause_refreshes().await;
    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.refresh_session().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.refresh_session().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    drop(guard);

    assert_eq!(first.await.unwrap().unwrap(), "tok2");
    assert_eq!(second.await.unwrap().unwrap(), "tok2");

    // The second caller reused the first caller's result
    assert_eq!(gateway.refresh_calls(), 1);
    assert_eq!(store.access_token(), Some("tok2".to_string()));
    assert_eq!(store.refresh_token(), Some("ref2".to_string()));
}

#[tokio::test]
async fn refresh_without_a_session_is_rejected() {
    let (controller, gateway, _) = rig();
    let err = controller.refresh_session().await.unwrap_err();
    assert_eq!(err, SessionError::AuthorizationExpired);
    assert_eq!(gateway.refresh_calls(), 0);
}

#[tokio::test]
async fn authorization_failure_tears_down_exactly_once() {
    let (controller, _, store) = rig();
    let mut events = controller.events();
    controller.login(creds()).await.unwrap();

    let clears_before = store.clear_calls();
    let first = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.handle_authorization_failure().await })
    };
    let second = {
        let controller = Arc::clone(&controller);
        tokio::spawn(async move { controller.handle_authorization_failure().await })
    };
    first.await.unwrap();
    second.await.unwrap();

    let session = controller.session().await;
    assert!(!session.is_authenticated());
    assert!(store.is_empty());

    // The clear/notify side effect ran a single time
    assert_eq!(store.clear_calls() - clears_before, 1);
    assert_eq!(events.recv().await.unwrap(), SessionEvent::AuthorizationExpired);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn teardown_rearms_after_the_next_login() {
    let (controller, _, _) = rig();
    let mut events = controller.events();

    controller.login(creds()).await.unwrap();
    controller.handle_authorization_failure().await;
    assert_eq!(events.recv().await.unwrap(), SessionEvent::AuthorizationExpired);

    controller.login(creds()).await.unwrap();
    controller.handle_authorization_failure().await;
    assert_eq!(events.recv().await.unwrap(), SessionEvent::AuthorizationExpired);
}

// ═══════════════════════════════════════════════════════════════════════
// UI surface
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn subscribers_see_every_committed_change_in_order() {
    let (controller, _, _) = rig();
    let mut rx = controller.subscribe();

    controller.login(creds()).await.unwrap();

    assert!(matches!(rx.recv().await.unwrap(), SessionAction::LoginStarted { .. }));
    assert!(matches!(rx.recv().await.unwrap(), SessionAction::LoginSucceeded { .. }));
}

#[tokio::test]
async fn clear_error_resets_the_error_field() {
    let (controller, gateway, _) = rig();
    gateway.set_login_result(Err(SessionError::InvalidCredentials));
    let _ = controller.login(creds()).await;
    assert!(controller.session().await.error.is_some());

    controller.clear_error().await;

    let session = controller.session().await;
    assert!(session.error.is_none());
    assert_eq!(session.phase, SessionPhase::Anonymous);
}
