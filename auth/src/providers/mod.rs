//! Session providers.
//!
//! This module defines traits for the two external dependencies of the
//! session subsystem - the network gateway and the durable credential
//! store - plus the request/payload models that cross those seams.
//!
//! Providers are **interfaces**, not implementations. The reducer and
//! controller depend on these traits; concrete implementations live in
//! [`crate::gateway`] (reqwest) and [`crate::stores`] (filesystem), and
//! in-memory mocks live in [`crate::mocks`].
//!
//! This enables:
//! - **Testing**: mocks run the full lifecycle at memory speed
//! - **Production**: real HTTP + filesystem implementations
//! - **Isolation**: the state machine never learns how bytes move

use crate::state::User;
use serde::{Deserialize, Serialize};

pub mod credentials;
pub mod gateway;

// Re-export provider traits
pub use credentials::{CredentialStore, StoredCredentials};
pub use gateway::AuthGateway;

/// Payload of a successful login or registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    /// Authenticated user.
    pub user: User,

    /// Short-lived access token.
    pub access_token: String,

    /// Longer-lived refresh token.
    pub refresh_token: String,
}

/// Payload of a successful token refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// New access token.
    pub access_token: String,

    /// New refresh token.
    pub refresh_token: String,
}

/// Login form data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Login username (the account email).
    pub username: String,

    /// Password.
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    /// Desired username.
    pub username: String,

    /// Email address.
    pub email: String,

    /// Password.
    pub password: String,

    /// Display name, if provided at signup.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// Partial profile update. Absent fields are left unchanged server-side.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// New avatar URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Password change request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    /// Current password, verified server-side.
    pub current_password: String,

    /// New password.
    pub new_password: String,
}
