//! Session state types.
//!
//! This module defines the core state types for the session subsystem.
//! All types are `Clone` to support the functional architecture pattern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Operation token for in-flight session mutations.
///
/// Every mutating controller operation captures an `OpId` before its
/// network call and only commits if the state still carries that token on
/// completion. A later operation (or an explicit logout) supersedes the
/// earlier one by installing its own token, so a stale completion can
/// never resurrect a torn-down session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OpId(pub u64);

// ═══════════════════════════════════════════════════════════════════════
// User
// ═══════════════════════════════════════════════════════════════════════

/// Role assigned to a user account.
///
/// Serialized as its lowercase name; role strings this client version
/// does not recognize deserialize to [`UserRole::Unknown`] rather than
/// failing the whole record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UserRole {
    /// Regular attendee.
    #[default]
    User,
    /// Event organizer.
    Organizer,
    /// Platform administrator.
    Admin,
    /// Role string not recognized by this client version.
    Unknown,
}

impl UserRole {
    /// Get the role name as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Organizer => "organizer",
            Self::Admin => "admin",
            Self::Unknown => "unknown",
        }
    }
}

impl From<String> for UserRole {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => Self::User,
            "organizer" => Self::Organizer,
            "admin" => Self::Admin,
            _ => Self::Unknown,
        }
    }
}

impl From<UserRole> for String {
    fn from(role: UserRole) -> Self {
        role.as_str().to_string()
    }
}

/// User record as held by the client.
///
/// Mirrors what the backend returns from login/register/profile endpoints;
/// timestamps are optional because not every endpoint includes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Backend identifier.
    pub id: String,

    /// Email address (also the login username).
    pub email: String,

    /// Display name, if the user has set one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Account role.
    #[serde(default)]
    pub role: UserRole,

    /// Account creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Last profile update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

// ═══════════════════════════════════════════════════════════════════════
// Session State
// ═══════════════════════════════════════════════════════════════════════

/// Lifecycle phase of the session state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No session; nothing in flight.
    #[default]
    Anonymous,
    /// A mutating operation is in flight.
    Authenticating,
    /// A session is established.
    Authenticated,
    /// The last operation failed and no session is established.
    Error,
}

/// Root session state - the sole mutable aggregate of the subsystem.
///
/// This is the single source of truth consumed by UI code. Authentication
/// status is derived from `user` via [`SessionState::is_authenticated`] and
/// is never stored separately.
///
/// # Examples
///
/// ```
/// # use sessionkit_auth::SessionState;
/// let state = SessionState::default();
/// assert!(!state.is_authenticated());
/// assert!(state.error.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Current user; present iff authenticated.
    pub user: Option<User>,

    /// Short-lived credential attached to authenticated requests.
    pub access_token: Option<String>,

    /// Longer-lived credential used to obtain a new access token.
    pub refresh_token: Option<String>,

    /// `true` while a login/register/logout/refresh operation is in flight.
    pub is_loading: bool,

    /// Last-operation failure message, cleared explicitly or on the next
    /// attempt.
    pub error: Option<String>,

    /// Current lifecycle phase.
    pub phase: SessionPhase,

    /// Token of the most recent mutating operation. Completion events that
    /// carry a different token are stale and are discarded.
    pub current_op: OpId,
}

impl SessionState {
    /// `true` iff a user record is present.
    ///
    /// This is the *only* authentication flag; it cannot diverge from
    /// `user` because it is computed from it.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    /// Both tokens, when the credential pair is complete.
    #[must_use]
    pub fn tokens(&self) -> Option<(&str, &str)> {
        match (self.access_token.as_deref(), self.refresh_token.as_deref()) {
            (Some(access), Some(refresh)) => Some((access, refresh)),
            _ => None,
        }
    }

    /// Reset to the empty/anonymous configuration, superseding any
    /// in-flight operation with `op`.
    pub(crate) fn clear_to_anonymous(&mut self, op: OpId) {
        self.user = None;
        self.access_token = None;
        self.refresh_token = None;
        self.is_loading = false;
        self.error = None;
        self.phase = SessionPhase::Anonymous;
        self.current_op = op;
    }
}
