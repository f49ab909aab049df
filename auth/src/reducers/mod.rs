//! Session reducer.
//!
//! Implements the session state machine:
//!
//! ```text
//! anonymous --restore--> authenticated | anonymous
//! anonymous|error --login/register--> authenticating --success--> authenticated
//!                                                    --failure--> error
//! authenticated --logout--> anonymous          (always, network is best-effort)
//! authenticated --update_profile/change_password--> authenticating
//!                                                    --success--> authenticated
//!                                                    --failure--> authenticated + error
//! any --authorization-expired--> anonymous
//! ```
//!
//! # Stale completions
//!
//! Every completion event carries the [`OpId`] its operation was started
//! with. A completion whose token no longer matches
//! `SessionState::current_op` was superseded (by a later operation or an
//! explicit logout) and is discarded without touching state - a stale
//! login success can never resurrect a torn-down session.
//!
//! # Storage writes
//!
//! Commit transitions enqueue their credential write on the environment's
//! writer funnel *inside the reducer run*. Reducer runs are serialized by
//! the Store, so writes reach storage in exactly the order their state
//! transitions committed.

use crate::actions::SessionAction;
use crate::environment::SessionEnvironment;
use crate::error::SessionError;
use crate::providers::AuthGateway;
use crate::state::{OpId, SessionPhase, SessionState, User};
use sessionkit_core::effect::Effect;
use sessionkit_core::reducer::Reducer;
use sessionkit_core::{SmallVec, smallvec};

/// Session reducer.
///
/// Generic over the gateway so the best-effort server logout effect can
/// capture a cloned gateway from the environment.
#[derive(Debug, Clone)]
pub struct SessionReducer<G> {
    /// Phantom data to hold the gateway type parameter.
    _phantom: std::marker::PhantomData<G>,
}

impl<G> SessionReducer<G> {
    /// Create a new session reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<G> Default for SessionReducer<G> {
    fn default() -> Self {
        Self::new()
    }
}

/// `true` (and logs) when a completion event no longer matches the
/// in-flight operation.
fn is_stale(state: &SessionState, op: OpId, event: &str) -> bool {
    if state.current_op == op {
        return false;
    }
    tracing::debug!(
        event,
        completed_op = op.0,
        current_op = state.current_op.0,
        "discarding stale completion"
    );
    true
}

/// Enter the in-flight configuration for operation `op`.
fn begin(state: &mut SessionState, op: OpId) {
    state.current_op = op;
    state.is_loading = true;
    state.error = None;
    state.phase = SessionPhase::Authenticating;
}

/// Record an operation failure that leaves any prior session untouched.
fn fail(state: &mut SessionState, error: &SessionError) {
    state.is_loading = false;
    state.error = Some(error.user_message());
    state.phase = if state.user.is_some() {
        SessionPhase::Authenticated
    } else {
        SessionPhase::Error
    };
}

/// Commit a full credential set into state and enqueue the matching
/// storage write.
fn establish<G: AuthGateway + Clone>(
    state: &mut SessionState,
    env: &SessionEnvironment<G>,
    user: User,
    access_token: String,
    refresh_token: String,
) {
    env.credentials
        .queue_save(user.clone(), access_token.clone(), refresh_token.clone());
    state.user = Some(user);
    state.access_token = Some(access_token);
    state.refresh_token = Some(refresh_token);
    state.is_loading = false;
    state.error = None;
    state.phase = SessionPhase::Authenticated;
}

impl<G> Reducer for SessionReducer<G>
where
    G: AuthGateway + Clone + Send + Sync + 'static,
{
    type State = SessionState;
    type Action = SessionAction;
    type Environment = SessionEnvironment<G>;

    #[allow(clippy::too_many_lines)] // one arm per state transition
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ═══════════════════════════════════════════════════════════
            // Operation starts
            // ═══════════════════════════════════════════════════════════
            SessionAction::LoginStarted { op }
            | SessionAction::RegisterStarted { op }
            | SessionAction::UpdateProfileStarted { op }
            | SessionAction::ChangePasswordStarted { op }
            | SessionAction::RefreshStarted { op } => {
                begin(state, op);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════
            // Login / Register completion
            // ═══════════════════════════════════════════════════════════
            SessionAction::LoginSucceeded {
                op,
                user,
                access_token,
                refresh_token,
            } => {
                if is_stale(state, op, "LoginSucceeded") {
                    return smallvec![Effect::None];
                }
                establish(state, env, user, access_token, refresh_token);
                smallvec![Effect::None]
            },

            SessionAction::RegisterSucceeded {
                op,
                user,
                access_token,
                refresh_token,
            } => {
                if is_stale(state, op, "RegisterSucceeded") {
                    return smallvec![Effect::None];
                }
                establish(state, env, user, access_token, refresh_token);
                smallvec![Effect::None]
            },

            SessionAction::LoginFailed { op, error } => {
                if !is_stale(state, op, "LoginFailed") {
                    fail(state, &error);
                }
                smallvec![Effect::None]
            },

            SessionAction::RegisterFailed { op, error } => {
                if !is_stale(state, op, "RegisterFailed") {
                    fail(state, &error);
                }
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════
            // Logout: local-state guarantee first, network second
            // ═══════════════════════════════════════════════════════════
            SessionAction::Logout { op } => {
                let access_token = state.access_token.clone();
                state.clear_to_anonymous(op);
                env.credentials.queue_clear();

                let gateway = env.gateway.clone();
                smallvec![Effect::Future(Box::pin(async move {
                    let success = match gateway.logout(access_token.as_deref()).await {
                        Ok(()) => true,
                        Err(error) => {
                            // Best-effort cleanup; never surfaced to the user
                            tracing::warn!(%error, "server-side logout failed");
                            false
                        },
                    };
                    Some(SessionAction::ServerLogoutSettled { success })
                }))]
            },

            SessionAction::ServerLogoutSettled { success } => {
                tracing::debug!(success, "server logout settled");
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════
            // Restore
            // ═══════════════════════════════════════════════════════════
            SessionAction::SessionRestored {
                op,
                user,
                access_token,
                refresh_token,
            } => {
                if is_stale(state, op, "SessionRestored") {
                    return smallvec![Effect::None];
                }
                // The record came from storage; trust it without writing
                // it back or calling the network.
                state.user = Some(user);
                state.access_token = Some(access_token);
                state.refresh_token = Some(refresh_token);
                state.phase = SessionPhase::Authenticated;
                smallvec![Effect::None]
            },

            SessionAction::RestoreRejected { op } => {
                if !is_stale(state, op, "RestoreRejected") {
                    tracing::warn!("partial credential record; tearing down");
                    state.clear_to_anonymous(op);
                    env.credentials.queue_clear();
                }
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════
            // Profile / password completion
            // ═══════════════════════════════════════════════════════════
            SessionAction::ProfileUpdated { op, user } => {
                if is_stale(state, op, "ProfileUpdated") {
                    return smallvec![Effect::None];
                }
                let tokens = state
                    .tokens()
                    .map(|(a, r)| (a.to_string(), r.to_string()));
                match tokens {
                    Some((access, refresh)) => {
                        env.credentials.queue_save(user.clone(), access, refresh);
                    },
                    None => {
                        tracing::warn!("profile updated without a token pair; not persisting");
                    },
                }
                state.user = Some(user);
                state.is_loading = false;
                state.error = None;
                state.phase = SessionPhase::Authenticated;
                smallvec![Effect::None]
            },

            SessionAction::UpdateProfileFailed { op, error }
            | SessionAction::ChangePasswordFailed { op, error } => {
                // A failed profile operation does not destroy the session
                if !is_stale(state, op, "ProfileOperationFailed") {
                    fail(state, &error);
                }
                smallvec![Effect::None]
            },

            SessionAction::PasswordChanged { op } => {
                if !is_stale(state, op, "PasswordChanged") {
                    state.is_loading = false;
                    state.error = None;
                    state.phase = SessionPhase::Authenticated;
                }
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════
            // Refresh completion
            // ═══════════════════════════════════════════════════════════
            SessionAction::TokensRefreshed {
                op,
                access_token,
                refresh_token,
            } => {
                if is_stale(state, op, "TokensRefreshed") {
                    return smallvec![Effect::None];
                }
                match state.user.clone() {
                    Some(user) => {
                        env.credentials.queue_save(
                            user,
                            access_token.clone(),
                            refresh_token.clone(),
                        );
                    },
                    None => {
                        tracing::warn!("tokens refreshed without a user record; not persisting");
                    },
                }
                state.access_token = Some(access_token);
                state.refresh_token = Some(refresh_token);
                state.is_loading = false;
                if state.user.is_some() {
                    state.phase = SessionPhase::Authenticated;
                }
                smallvec![Effect::None]
            },

            SessionAction::RefreshFailed { op, error } => {
                // Refresh failures are never user-facing; the interceptor
                // decides whether this escalates to teardown.
                if !is_stale(state, op, "RefreshFailed") {
                    tracing::debug!(%error, "token refresh failed");
                    state.is_loading = false;
                    state.phase = if state.user.is_some() {
                        SessionPhase::Authenticated
                    } else {
                        SessionPhase::Anonymous
                    };
                }
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════
            // Teardown & housekeeping
            // ═══════════════════════════════════════════════════════════
            SessionAction::AuthorizationExpired { op } => {
                if !state.is_authenticated() && state.tokens().is_none() {
                    // Already clear; concurrent failures are no-ops
                    tracing::debug!("authorization expired on an anonymous session");
                    return smallvec![Effect::None];
                }
                state.clear_to_anonymous(op);
                env.credentials.queue_clear();
                smallvec![Effect::None]
            },

            SessionAction::ClearError => {
                state.error = None;
                if state.phase == SessionPhase::Error {
                    state.phase = if state.user.is_some() {
                        SessionPhase::Authenticated
                    } else {
                        SessionPhase::Anonymous
                    };
                }
                smallvec![Effect::None]
            },
        }
    }
}
