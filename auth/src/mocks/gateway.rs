//! Mock auth gateway for testing.

#![allow(clippy::unwrap_used)] // Mutex poison is unrecoverable in test utilities

use crate::error::Result;
use crate::providers::{
    AuthGateway, AuthPayload, LoginRequest, PasswordChange, ProfileUpdate, RegisterRequest,
    TokenPair,
};
use crate::state::{User, UserRole};
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// Programmable in-memory gateway.
///
/// Every operation returns a preconfigured result (successful by default)
/// and counts its calls. Logins additionally pass through a gate the test
/// can hold closed, to keep a login "in flight" while something else
/// happens.
#[derive(Clone)]
pub struct MockAuthGateway {
    inner: Arc<Mutex<Inner>>,
    login_gate: Arc<tokio::sync::Mutex<()>>,
    refresh_gate: Arc<tokio::sync::Mutex<()>>,
}

struct Inner {
    login_result: Result<AuthPayload>,
    register_result: Result<AuthPayload>,
    logout_result: Result<()>,
    refresh_result: Result<TokenPair>,
    profile_result: Result<User>,
    password_result: Result<()>,
    current_user_result: Result<User>,
    login_calls: usize,
    register_calls: usize,
    logout_calls: usize,
    refresh_calls: usize,
    profile_calls: usize,
    password_calls: usize,
    current_user_calls: usize,
}

impl MockAuthGateway {
    /// Create a gateway where every operation succeeds with sample data.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                login_result: Ok(Self::sample_payload()),
                register_result: Ok(Self::sample_payload()),
                logout_result: Ok(()),
                refresh_result: Ok(TokenPair {
                    access_token: "tok2".to_string(),
                    refresh_token: "ref2".to_string(),
                }),
                profile_result: Ok(Self::sample_user()),
                password_result: Ok(()),
                current_user_result: Ok(Self::sample_user()),
                login_calls: 0,
                register_calls: 0,
                logout_calls: 0,
                refresh_calls: 0,
                profile_calls: 0,
                password_calls: 0,
                current_user_calls: 0,
            })),
            login_gate: Arc::new(tokio::sync::Mutex::new(())),
            refresh_gate: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// The user every successful sample operation returns.
    #[must_use]
    pub fn sample_user() -> User {
        User {
            id: "1".to_string(),
            email: "a@x.com".to_string(),
            display_name: Some("Alice".to_string()),
            role: UserRole::User,
            created_at: None,
            updated_at: None,
        }
    }

    /// The payload every successful sample login/register returns.
    #[must_use]
    pub fn sample_payload() -> AuthPayload {
        AuthPayload {
            user: Self::sample_user(),
            access_token: "tok1".to_string(),
            refresh_token: "ref1".to_string(),
        }
    }

    /// Hold logins in flight until the returned guard is dropped.
    pub async fn pause_logins(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.login_gate).lock_owned().await
    }

    /// Hold refreshes in flight until the returned guard is dropped.
    pub async fn pause_refreshes(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.refresh_gate).lock_owned().await
    }

    /// Set the result of the next logins.
    pub fn set_login_result(&self, result: Result<AuthPayload>) {
        self.inner.lock().unwrap().login_result = result;
    }

    /// Set the result of the next registrations.
    pub fn set_register_result(&self, result: Result<AuthPayload>) {
        self.inner.lock().unwrap().register_result = result;
    }

    /// Set the result of the next logouts.
    pub fn set_logout_result(&self, result: Result<()>) {
        self.inner.lock().unwrap().logout_result = result;
    }

    /// Set the result of the next refreshes.
    pub fn set_refresh_result(&self, result: Result<TokenPair>) {
        self.inner.lock().unwrap().refresh_result = result;
    }

    /// Set the result of the next profile updates.
    pub fn set_profile_result(&self, result: Result<User>) {
        self.inner.lock().unwrap().profile_result = result;
    }

    /// Set the result of the next password changes.
    pub fn set_password_result(&self, result: Result<()>) {
        self.inner.lock().unwrap().password_result = result;
    }

    /// Number of login calls so far.
    #[must_use]
    pub fn login_calls(&self) -> usize {
        self.inner.lock().unwrap().login_calls
    }

    /// Number of logout calls so far.
    #[must_use]
    pub fn logout_calls(&self) -> usize {
        self.inner.lock().unwrap().logout_calls
    }

    /// Number of refresh calls so far.
    #[must_use]
    pub fn refresh_calls(&self) -> usize {
        self.inner.lock().unwrap().refresh_calls
    }

    /// Number of register calls so far.
    #[must_use]
    pub fn register_calls(&self) -> usize {
        self.inner.lock().unwrap().register_calls
    }

    /// Number of profile-update calls so far.
    #[must_use]
    pub fn profile_calls(&self) -> usize {
        self.inner.lock().unwrap().profile_calls
    }

    /// Number of password-change calls so far.
    #[must_use]
    pub fn password_calls(&self) -> usize {
        self.inner.lock().unwrap().password_calls
    }

    /// Number of current-user calls so far.
    #[must_use]
    pub fn current_user_calls(&self) -> usize {
        self.inner.lock().unwrap().current_user_calls
    }
}

impl Default for MockAuthGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthGateway for MockAuthGateway {
    async fn login(&self, _request: &LoginRequest) -> Result<AuthPayload> {
        let _gate = self.login_gate.lock().await;
        let mut inner = self.inner.lock().unwrap();
        inner.login_calls += 1;
        inner.login_result.clone()
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<AuthPayload> {
        let mut inner = self.inner.lock().unwrap();
        inner.register_calls += 1;
        inner.register_result.clone()
    }

    async fn logout(&self, _access_token: Option<&str>) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.logout_calls += 1;
        inner.logout_result.clone()
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<TokenPair> {
        let _gate = self.refresh_gate.lock().await;
        let mut inner = self.inner.lock().unwrap();
        inner.refresh_calls += 1;
        inner.refresh_result.clone()
    }

    async fn current_user(&self, _access_token: &str) -> Result<User> {
        let mut inner = self.inner.lock().unwrap();
        inner.current_user_calls += 1;
        inner.current_user_result.clone()
    }

    async fn update_profile(
        &self,
        _user_id: &str,
        _update: &ProfileUpdate,
        _access_token: &str,
    ) -> Result<User> {
        let mut inner = self.inner.lock().unwrap();
        inner.profile_calls += 1;
        inner.profile_result.clone()
    }

    async fn change_password(
        &self,
        _user_id: &str,
        _change: &PasswordChange,
        _access_token: &str,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.password_calls += 1;
        inner.password_result.clone()
    }
}
