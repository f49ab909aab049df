//! Session controller.
//!
//! The imperative shell around the session reducer: owns the Store, the
//! credential writer funnel, and the operation-token counter, and exposes
//! the surface UI code calls.
//!
//! # Operation protocol
//!
//! Every mutating operation follows the same shape:
//!
//! 1. allocate an [`OpId`] and dispatch the `…Started` action - the
//!    reducer enters the in-flight configuration and records the token;
//! 2. await the gateway call, holding no locks across the suspend point;
//! 3. dispatch the `…Succeeded`/`…Failed` action - the reducer commits
//!    iff the token still matches (a later operation or logout wins
//!    otherwise) and enqueues the credential write;
//! 4. flush the credential funnel, so storage has been updated before the
//!    operation returns.
//!
//! The controller is an explicitly constructed instance with injected
//! gateway and credential store - constructed once at application start,
//! torn down never, but deliberately not a hidden ambient global.

use crate::actions::SessionAction;
use crate::config::SessionConfig;
use crate::environment::SessionEnvironment;
use crate::error::{Result, SessionError};
use crate::events::SessionEvent;
use crate::gateway::HttpAuthGateway;
use crate::providers::{
    AuthGateway, CredentialStore, LoginRequest, PasswordChange, ProfileUpdate, RegisterRequest,
};
use crate::reducers::SessionReducer;
use crate::state::{OpId, SessionState, User};
use crate::stores::{CredentialHandle, CredentialWriter, FileCredentialStore};
use sessionkit_runtime::{EffectHandle, Store};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::{Mutex, broadcast};

type SessionStore<G> =
    Store<SessionState, SessionAction, SessionEnvironment<G>, SessionReducer<G>>;

/// Orchestrates Session State, the Credential Store, and the Auth Gateway.
pub struct SessionController<G>
where
    G: AuthGateway + Clone + Send + Sync + 'static,
{
    store: SessionStore<G>,
    gateway: G,
    credentials: CredentialHandle,
    next_op: AtomicU64,
    /// Serializes token refreshes (single-flight); see [`Self::refresh_session`].
    refresh_gate: Mutex<()>,
    /// Set by the first authorization-failure teardown, re-armed on the
    /// next successful authentication. Concurrent failures are no-ops.
    teardown_done: AtomicBool,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController<HttpAuthGateway> {
    /// Wire up the production stack: HTTP gateway + file credential store.
    ///
    /// # Errors
    ///
    /// Returns `Network` if the HTTP client cannot be built and `Storage`
    /// if the state directory is unusable.
    pub async fn from_config(config: &SessionConfig) -> Result<Self> {
        let gateway = HttpAuthGateway::new(config)?;
        let store = FileCredentialStore::open(&config.state_dir).await?;
        Ok(Self::new(gateway, store))
    }
}

impl<G> SessionController<G>
where
    G: AuthGateway + Clone + Send + Sync + 'static,
{
    /// Create a controller around injected dependencies.
    ///
    /// Spawns the credential writer task; must be called from within a
    /// tokio runtime.
    #[must_use]
    pub fn new<C>(gateway: G, credential_store: C) -> Self
    where
        C: CredentialStore + Send + 'static,
    {
        let credentials = CredentialWriter::spawn(credential_store);
        let environment = SessionEnvironment::new(gateway.clone(), credentials.clone());
        let store = Store::new(SessionState::default(), SessionReducer::new(), environment);
        let (events, _) = broadcast::channel(16);

        Self {
            store,
            gateway,
            credentials,
            next_op: AtomicU64::new(0),
            refresh_gate: Mutex::new(()),
            teardown_done: AtomicBool::new(false),
            events,
        }
    }

    fn alloc_op(&self) -> OpId {
        OpId(self.next_op.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn dispatch(&self, action: SessionAction) -> EffectHandle {
        match self.store.send(action).await {
            Ok(handle) => handle,
            Err(error) => {
                tracing::error!(%error, "failed to dispatch session action");
                EffectHandle::completed()
            },
        }
    }

    /// Whether operation `op` is still the in-flight one (its completion
    /// committed rather than being superseded).
    async fn committed(&self, op: OpId) -> bool {
        self.store.state(|s| s.current_op == op).await
    }

    // ═══════════════════════════════════════════════════════════════════
    // Mutating operations
    // ═══════════════════════════════════════════════════════════════════

    /// Sign in.
    ///
    /// On success both Session State and the Credential Store hold the new
    /// user and token pair before this returns. If a concurrent `logout()`
    /// superseded the operation, the returned user is *not* signed in -
    /// session state stays authoritative.
    ///
    /// # Errors
    ///
    /// The gateway failure, already mapped into `SessionState.error` as a
    /// human-readable message.
    pub async fn login(&self, request: LoginRequest) -> Result<User> {
        let op = self.alloc_op();
        self.dispatch(SessionAction::LoginStarted { op }).await;

        match self.gateway.login(&request).await {
            Ok(payload) => {
                self.dispatch(SessionAction::LoginSucceeded {
                    op,
                    user: payload.user.clone(),
                    access_token: payload.access_token,
                    refresh_token: payload.refresh_token,
                })
                .await;
                self.credentials.flush().await;
                if self.committed(op).await {
                    self.teardown_done.store(false, Ordering::SeqCst);
                }
                Ok(payload.user)
            },
            Err(error) => {
                self.dispatch(SessionAction::LoginFailed {
                    op,
                    error: error.clone(),
                })
                .await;
                Err(error)
            },
        }
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// The gateway failure, typically `Validation` with the offending field.
    pub async fn register(&self, request: RegisterRequest) -> Result<User> {
        let op = self.alloc_op();
        self.dispatch(SessionAction::RegisterStarted { op }).await;

        match self.gateway.register(&request).await {
            Ok(payload) => {
                self.dispatch(SessionAction::RegisterSucceeded {
                    op,
                    user: payload.user.clone(),
                    access_token: payload.access_token,
                    refresh_token: payload.refresh_token,
                })
                .await;
                self.credentials.flush().await;
                if self.committed(op).await {
                    self.teardown_done.store(false, Ordering::SeqCst);
                }
                Ok(payload.user)
            },
            Err(error) => {
                self.dispatch(SessionAction::RegisterFailed {
                    op,
                    error: error.clone(),
                })
                .await;
                Err(error)
            },
        }
    }

    /// Sign out.
    ///
    /// Session State and the Credential Store are cleared before this
    /// returns; the server round-trip continues in the background and its
    /// outcome is never surfaced. The returned handle resolves when that
    /// background call settles (useful in tests).
    pub async fn logout(&self) -> EffectHandle {
        let op = self.alloc_op();
        let handle = self.dispatch(SessionAction::Logout { op }).await;
        self.credentials.flush().await;
        handle
    }

    /// Re-hydrate the session from the Credential Store at startup.
    ///
    /// A well-formed stored record is trusted without a network call; the
    /// first authorization failure corrects optimistic state. Failures
    /// here never surface - they degrade to an anonymous session. An
    /// explicit `login()` racing this call supersedes it.
    pub async fn restore_session(&self) {
        let observed = self.store.state(|s| s.current_op).await;

        let stored = match self.credentials.load().await {
            Ok(stored) => stored,
            Err(error) => {
                tracing::debug!(%error, "credential load failed; staying anonymous");
                return;
            },
        };

        if stored.is_empty() {
            return;
        }

        match stored.complete() {
            Some((user, access_token, refresh_token)) => {
                self.dispatch(SessionAction::SessionRestored {
                    op: observed,
                    user,
                    access_token,
                    refresh_token,
                })
                .await;
                if self.committed(observed).await {
                    self.teardown_done.store(false, Ordering::SeqCst);
                }
            },
            None => {
                // Partial credential state is invalid: full teardown
                self.dispatch(SessionAction::RestoreRejected { op: observed })
                    .await;
                self.credentials.flush().await;
            },
        }
    }

    /// Update profile fields of the signed-in user.
    ///
    /// # Errors
    ///
    /// `AuthorizationExpired` when no session is established; otherwise
    /// the gateway failure. The session and prior user data survive a
    /// failure.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<User> {
        let Some((user_id, access_token)) = self.authed_identity().await else {
            return Err(SessionError::AuthorizationExpired);
        };

        let op = self.alloc_op();
        self.dispatch(SessionAction::UpdateProfileStarted { op })
            .await;

        match self
            .gateway
            .update_profile(&user_id, &update, &access_token)
            .await
        {
            Ok(user) => {
                self.dispatch(SessionAction::ProfileUpdated {
                    op,
                    user: user.clone(),
                })
                .await;
                self.credentials.flush().await;
                Ok(user)
            },
            Err(error) => {
                self.dispatch(SessionAction::UpdateProfileFailed {
                    op,
                    error: error.clone(),
                })
                .await;
                Err(error)
            },
        }
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// `AuthorizationExpired` when no session is established;
    /// `InvalidCredentials` when the current password is wrong.
    pub async fn change_password(&self, change: PasswordChange) -> Result<()> {
        let Some((user_id, access_token)) = self.authed_identity().await else {
            return Err(SessionError::AuthorizationExpired);
        };

        let op = self.alloc_op();
        self.dispatch(SessionAction::ChangePasswordStarted { op })
            .await;

        match self
            .gateway
            .change_password(&user_id, &change, &access_token)
            .await
        {
            Ok(()) => {
                self.dispatch(SessionAction::PasswordChanged { op }).await;
                Ok(())
            },
            Err(error) => {
                self.dispatch(SessionAction::ChangePasswordFailed {
                    op,
                    error: error.clone(),
                })
                .await;
                Err(error)
            },
        }
    }

    /// Exchange the refresh token for a new token pair (single-flight).
    ///
    /// Concurrent callers serialize on an internal gate; a caller that
    /// waited while another refresh completed reuses the fresh token
    /// instead of refreshing again.
    ///
    /// # Errors
    ///
    /// `AuthorizationExpired` when there is no refresh token (or the
    /// session disappeared while waiting); otherwise the gateway failure.
    pub async fn refresh_session(&self) -> Result<String> {
        let before = self.store.state(|s| s.access_token.clone()).await;
        let _gate = self.refresh_gate.lock().await;

        // Double-check after acquiring the gate: another caller may have
        // refreshed (or torn down) while we waited.
        let (current, refresh_token) = self
            .store
            .state(|s| (s.access_token.clone(), s.refresh_token.clone()))
            .await;
        if current != before {
            return match current {
                Some(token) => {
                    tracing::debug!("reusing token refreshed by a concurrent caller");
                    Ok(token)
                },
                None => Err(SessionError::AuthorizationExpired),
            };
        }
        let Some(refresh_token) = refresh_token else {
            return Err(SessionError::AuthorizationExpired);
        };

        let op = self.alloc_op();
        self.dispatch(SessionAction::RefreshStarted { op }).await;

        match self.gateway.refresh(&refresh_token).await {
            Ok(pair) => {
                self.dispatch(SessionAction::TokensRefreshed {
                    op,
                    access_token: pair.access_token.clone(),
                    refresh_token: pair.refresh_token,
                })
                .await;
                self.credentials.flush().await;
                Ok(pair.access_token)
            },
            Err(error) => {
                self.dispatch(SessionAction::RefreshFailed {
                    op,
                    error: error.clone(),
                })
                .await;
                Err(error)
            },
        }
    }

    /// Tear the session down after an unrecoverable authorization failure.
    ///
    /// Exactly-once: concurrent callers (several requests failing with 401
    /// at the same time) perform the clear/notify side effect a single
    /// time; the rest are no-ops because the session is already clear.
    pub async fn handle_authorization_failure(&self) {
        if self.teardown_done.swap(true, Ordering::SeqCst) {
            tracing::debug!("authorization failure already handled");
            return;
        }

        tracing::info!("authorization expired; tearing down session");
        let op = self.alloc_op();
        self.dispatch(SessionAction::AuthorizationExpired { op })
            .await;
        self.credentials.flush().await;
        let _ = self.events.send(SessionEvent::AuthorizationExpired);
    }

    /// Clear the last-operation error message.
    pub async fn clear_error(&self) {
        self.dispatch(SessionAction::ClearError).await;
    }

    // ═══════════════════════════════════════════════════════════════════
    // Read surface
    // ═══════════════════════════════════════════════════════════════════

    /// Read-only snapshot of the current session state.
    pub async fn session(&self) -> SessionState {
        self.store.state(Clone::clone).await
    }

    /// Subscribe to every committed session change (UI re-render driver).
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionAction> {
        self.store.subscribe_actions()
    }

    /// Subscribe to out-of-band session events (navigation driver).
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Handle to the credential funnel; the interceptor reads the stored
    /// access token through this.
    #[must_use]
    pub const fn credentials(&self) -> &CredentialHandle {
        &self.credentials
    }

    async fn authed_identity(&self) -> Option<(String, String)> {
        self.store
            .state(|s| match (&s.user, &s.access_token) {
                (Some(user), Some(token)) => Some((user.id.clone(), token.clone())),
                _ => None,
            })
            .await
    }
}

impl<G> std::fmt::Debug for SessionController<G>
where
    G: AuthGateway + Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("next_op", &self.next_op.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
