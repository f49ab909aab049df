//! Credential store trait.
//!
//! Durable key/value persistence surviving restarts, scoped to exactly
//! three keys: `accessToken`, `refreshToken`, and `user` (JSON-serialized).
//! No other component writes these keys.

use crate::error::Result;
use crate::state::User;
use serde::{Deserialize, Serialize};

/// What the credential store currently holds.
///
/// `load()` returns whatever is present; a record with some-but-not-all
/// keys is *partial*, which the caller must treat as invalid and tear
/// down (see [`StoredCredentials::complete`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredCredentials {
    /// Stored user record, if present and well-formed.
    pub user: Option<User>,

    /// Stored access token.
    pub access_token: Option<String>,

    /// Stored refresh token.
    pub refresh_token: Option<String>,
}

impl StoredCredentials {
    /// `true` when none of the three keys is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.user.is_none() && self.access_token.is_none() && self.refresh_token.is_none()
    }

    /// The full record, or `None` when any key is missing.
    #[must_use]
    pub fn complete(self) -> Option<(User, String, String)> {
        match (self.user, self.access_token, self.refresh_token) {
            (Some(user), Some(access), Some(refresh)) => Some((user, access, refresh)),
            _ => None,
        }
    }
}

/// Durable persistence for the three credential keys.
///
/// # Implementation Notes
///
/// - `save()` is atomic from the caller's point of view: implementers write
///   in a fixed order and treat partial failure as total failure, rolling
///   the others back.
/// - `load()` must not error on a corrupt user record: clear all three keys
///   and return an empty record instead.
/// - `clear()` is idempotent and safe to call when already empty.
///
/// Callers must serialize mutations; the controller funnels all writes
/// through a single writer task (see [`crate::stores::CredentialWriter`]),
/// so implementations need no internal write locking of their own.
pub trait CredentialStore: Send + Sync {
    /// Persist all three keys.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if persistence fails; the store has rolled back
    /// to the empty configuration when it does.
    fn save(
        &self,
        user: &User,
        access_token: &str,
        refresh_token: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Read whatever is present.
    ///
    /// # Errors
    ///
    /// Returns `Storage` only for I/O failures - never for corrupt data,
    /// which is recovered by clearing.
    fn load(&self) -> impl std::future::Future<Output = Result<StoredCredentials>> + Send;

    /// Remove all three keys.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if removal fails for a reason other than the keys
    /// already being absent.
    fn clear(&self) -> impl std::future::Future<Output = Result<()>> + Send;
}
