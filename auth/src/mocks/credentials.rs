//! Mock credential store for testing.

#![allow(clippy::unwrap_used)] // Mutex poison is unrecoverable in test utilities

use crate::error::{Result, SessionError};
use crate::providers::{CredentialStore, StoredCredentials};
use crate::state::User;
use std::sync::{Arc, Mutex};
use tokio::sync::OwnedMutexGuard;

/// In-memory credential store.
///
/// Holds the three keys as raw strings (the user record as its JSON
/// serialization) so tests can inject corrupt data exactly the way a
/// broken persistent store would present it.
#[derive(Clone, Default)]
pub struct MockCredentialStore {
    inner: Arc<Mutex<Inner>>,
    load_gate: Arc<tokio::sync::Mutex<()>>,
}

#[derive(Default)]
struct Inner {
    access_token: Option<String>,
    refresh_token: Option<String>,
    user_json: Option<String>,
    fail_save: bool,
    save_calls: usize,
    clear_calls: usize,
}

impl MockCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the token keys.
    pub fn set_tokens(&self, access_token: Option<&str>, refresh_token: Option<&str>) {
        let mut inner = self.inner.lock().unwrap();
        inner.access_token = access_token.map(str::to_string);
        inner.refresh_token = refresh_token.map(str::to_string);
    }

    /// Pre-populate the user key from a record.
    pub fn set_user(&self, user: &User) {
        self.inner.lock().unwrap().user_json = Some(serde_json::to_string(user).unwrap());
    }

    /// Write a raw (possibly unparsable) string to the user key.
    pub fn set_raw_user(&self, raw: &str) {
        self.inner.lock().unwrap().user_json = Some(raw.to_string());
    }

    /// Make subsequent saves fail (after rolling back, per the contract).
    pub fn set_fail_save(&self, fail: bool) {
        self.inner.lock().unwrap().fail_save = fail;
    }

    /// Hold loads in flight until the returned guard is dropped.
    pub async fn pause_loads(&self) -> OwnedMutexGuard<()> {
        Arc::clone(&self.load_gate).lock_owned().await
    }

    /// Current value of the access-token key.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.inner.lock().unwrap().access_token.clone()
    }

    /// Current value of the refresh-token key.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.inner.lock().unwrap().refresh_token.clone()
    }

    /// Parsed user record, if present and well-formed.
    #[must_use]
    pub fn stored_user(&self) -> Option<User> {
        self.inner
            .lock()
            .unwrap()
            .user_json
            .as_deref()
            .and_then(|raw| serde_json::from_str(raw).ok())
    }

    /// `true` when none of the three keys is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        inner.access_token.is_none() && inner.refresh_token.is_none() && inner.user_json.is_none()
    }

    /// Number of save calls so far.
    #[must_use]
    pub fn save_calls(&self) -> usize {
        self.inner.lock().unwrap().save_calls
    }

    /// Number of clear calls so far.
    #[must_use]
    pub fn clear_calls(&self) -> usize {
        self.inner.lock().unwrap().clear_calls
    }
}

impl CredentialStore for MockCredentialStore {
    async fn save(&self, user: &User, access_token: &str, refresh_token: &str) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.save_calls += 1;

        if inner.fail_save {
            // Partial failure is total failure: roll back to empty
            inner.access_token = None;
            inner.refresh_token = None;
            inner.user_json = None;
            return Err(SessionError::Storage("save failed".to_string()));
        }

        inner.access_token = Some(access_token.to_string());
        inner.refresh_token = Some(refresh_token.to_string());
        inner.user_json = Some(
            serde_json::to_string(user)
                .map_err(|e| SessionError::Storage(format!("serialize user: {e}")))?,
        );
        Ok(())
    }

    async fn load(&self) -> Result<StoredCredentials> {
        let _gate = self.load_gate.lock().await;
        let mut inner = self.inner.lock().unwrap();

        let user = match inner.user_json.as_deref() {
            None => None,
            Some(raw) => match serde_json::from_str::<User>(raw) {
                Ok(user) => Some(user),
                Err(error) => {
                    // Corrupt record: clear all three keys and report empty
                    tracing::warn!(%error, "corrupt stored user record; clearing credentials");
                    inner.access_token = None;
                    inner.refresh_token = None;
                    inner.user_json = None;
                    return Ok(StoredCredentials::default());
                },
            },
        };

        Ok(StoredCredentials {
            user,
            access_token: inner.access_token.clone(),
            refresh_token: inner.refresh_token.clone(),
        })
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.access_token = None;
        inner.refresh_token = None;
        inner.user_json = None;
        inner.clear_calls += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::UserRole;

    fn alice() -> User {
        User {
            id: "1".to_string(),
            email: "a@x.com".to_string(),
            display_name: None,
            role: UserRole::User,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = MockCredentialStore::new();
        store.save(&alice(), "tok1", "ref1").await.unwrap();

        let stored = store.load().await.unwrap();
        assert_eq!(stored.user, Some(alice()));
        assert_eq!(stored.access_token, Some("tok1".to_string()));
        assert_eq!(stored.refresh_token, Some("ref1".to_string()));
    }

    #[tokio::test]
    async fn corrupt_user_record_clears_everything_on_load() {
        let store = MockCredentialStore::new();
        store.set_tokens(Some("tok1"), Some("ref1"));
        store.set_raw_user("{definitely not json");

        let stored = store.load().await.unwrap();
        assert!(stored.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn failed_save_rolls_back_to_empty() {
        let store = MockCredentialStore::new();
        store.save(&alice(), "tok1", "ref1").await.unwrap();
        store.set_fail_save(true);

        let err = store.save(&alice(), "tok2", "ref2").await.unwrap_err();
        assert!(matches!(err, SessionError::Storage(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn clear_twice_equals_clear_once() {
        let store = MockCredentialStore::new();
        store.save(&alice(), "tok1", "ref1").await.unwrap();

        store.clear().await.unwrap();
        let after_once = store.is_empty();
        store.clear().await.unwrap();

        assert!(after_once);
        assert!(store.is_empty());
    }
}
