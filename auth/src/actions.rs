//! Session actions.
//!
//! This module defines all possible inputs to the session reducer:
//! - **Commands**: operation starts issued by the controller
//!   (`LoginStarted`, `Logout`, …)
//! - **Events**: results of async operations (`LoginSucceeded`,
//!   `RefreshFailed`, …)
//!
//! Completion events carry the [`OpId`] their operation was started with;
//! the reducer discards any completion whose token no longer matches
//! `SessionState::current_op` (the operation was superseded).

use crate::error::SessionError;
use crate::state::{OpId, User};
use serde::{Deserialize, Serialize};

/// Session action.
///
/// Actions are the **only** way to mutate session state. The reducer is a
/// pure function: `(State, Action, Env) → (State, Effects)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionAction {
    // ═══════════════════════════════════════════════════════════════════
    // Login
    // ═══════════════════════════════════════════════════════════════════
    /// A login operation entered flight.
    LoginStarted {
        /// Operation token.
        op: OpId,
    },

    /// The login network call resolved successfully.
    LoginSucceeded {
        /// Token captured at `LoginStarted`; stale values are discarded.
        op: OpId,
        /// Authenticated user.
        user: User,
        /// New access token.
        access_token: String,
        /// New refresh token.
        refresh_token: String,
    },

    /// The login network call failed.
    LoginFailed {
        /// Token captured at `LoginStarted`.
        op: OpId,
        /// Failure reason.
        error: SessionError,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Register
    // ═══════════════════════════════════════════════════════════════════
    /// A register operation entered flight.
    RegisterStarted {
        /// Operation token.
        op: OpId,
    },

    /// Registration resolved successfully; the new account is signed in.
    RegisterSucceeded {
        /// Token captured at `RegisterStarted`.
        op: OpId,
        /// Newly created user.
        user: User,
        /// New access token.
        access_token: String,
        /// New refresh token.
        refresh_token: String,
    },

    /// Registration failed.
    RegisterFailed {
        /// Token captured at `RegisterStarted`.
        op: OpId,
        /// Failure reason.
        error: SessionError,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Logout
    // ═══════════════════════════════════════════════════════════════════
    /// Tear down the session locally and notify the server best-effort.
    ///
    /// Local state and the credential store are cleared in this reducer
    /// run; the server round-trip happens afterwards as a background
    /// effect and its outcome never surfaces to the user.
    Logout {
        /// Fresh token; installing it supersedes any in-flight operation.
        op: OpId,
    },

    /// The best-effort server logout settled (confirmation event, no-op).
    ServerLogoutSettled {
        /// Whether the server acknowledged the logout.
        success: bool,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Restore
    // ═══════════════════════════════════════════════════════════════════
    /// A complete credential record was read from storage at startup.
    ///
    /// The stored user is trusted without a network round-trip; the first
    /// authorization failure corrects optimistic state.
    SessionRestored {
        /// `current_op` observed before reading storage. A login that
        /// started in the meantime supersedes the restore.
        op: OpId,
        /// Stored user record.
        user: User,
        /// Stored access token.
        access_token: String,
        /// Stored refresh token.
        refresh_token: String,
    },

    /// The stored credential record was partial; tear it down.
    RestoreRejected {
        /// `current_op` observed before reading storage.
        op: OpId,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Profile
    // ═══════════════════════════════════════════════════════════════════
    /// A profile update entered flight.
    UpdateProfileStarted {
        /// Operation token.
        op: OpId,
    },

    /// Profile update succeeded; the returned user replaces the current one.
    ProfileUpdated {
        /// Token captured at `UpdateProfileStarted`.
        op: OpId,
        /// Updated user record.
        user: User,
    },

    /// Profile update failed; the session and prior user data survive.
    UpdateProfileFailed {
        /// Token captured at `UpdateProfileStarted`.
        op: OpId,
        /// Failure reason.
        error: SessionError,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Password
    // ═══════════════════════════════════════════════════════════════════
    /// A password change entered flight.
    ChangePasswordStarted {
        /// Operation token.
        op: OpId,
    },

    /// Password change succeeded; credentials are unchanged.
    PasswordChanged {
        /// Token captured at `ChangePasswordStarted`.
        op: OpId,
    },

    /// Password change failed; the session survives with `error` set.
    ChangePasswordFailed {
        /// Token captured at `ChangePasswordStarted`.
        op: OpId,
        /// Failure reason.
        error: SessionError,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Refresh
    // ═══════════════════════════════════════════════════════════════════
    /// A token refresh entered flight.
    RefreshStarted {
        /// Operation token.
        op: OpId,
    },

    /// The refresh endpoint returned a new token pair.
    TokensRefreshed {
        /// Token captured at `RefreshStarted`.
        op: OpId,
        /// New access token.
        access_token: String,
        /// New refresh token.
        refresh_token: String,
    },

    /// The refresh call failed. The caller decides whether this escalates
    /// to teardown; refresh failures are never user-facing errors.
    RefreshFailed {
        /// Token captured at `RefreshStarted`.
        op: OpId,
        /// Failure reason.
        error: SessionError,
    },

    // ═══════════════════════════════════════════════════════════════════
    // Teardown & housekeeping
    // ═══════════════════════════════════════════════════════════════════
    /// The interceptor detected an unrecoverable authorization failure.
    ///
    /// Clears session state and the credential store. A no-op when the
    /// session is already anonymous.
    AuthorizationExpired {
        /// Fresh token; installing it supersedes any in-flight operation.
        op: OpId,
    },

    /// Clear the last-operation error message.
    ClearError,
}
