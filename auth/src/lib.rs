//! # Sessionkit Auth
//!
//! Client-side session and credential lifecycle management: how a client
//! obtains, stores, refreshes, and invalidates authentication tokens, and
//! how that state is kept consistent between durable storage, in-memory
//! session state, and outgoing requests across concurrent operations.
//!
//! ## Components
//!
//! - **Session State** ([`SessionState`]): the in-memory aggregate UI code
//!   renders from; authentication status is derived, never stored.
//! - **Session Controller** ([`SessionController`]): orchestrates every
//!   operation (login, register, logout, restore, refresh, profile,
//!   password) and keeps state and storage in lockstep.
//! - **Credential Store** ([`providers::CredentialStore`],
//!   [`stores::FileCredentialStore`]): durable owner of the three keys
//!   `accessToken`, `refreshToken`, `user`.
//! - **Auth Gateway** ([`providers::AuthGateway`],
//!   [`gateway::HttpAuthGateway`]): pure request/response mapping to the
//!   backend.
//! - **Request Interceptor Chain** ([`ApiClient`]): attaches the bearer
//!   token to application requests and handles 401s with a single-flight
//!   refresh, one retry, and exactly-once teardown.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sessionkit_auth::{SessionConfig, SessionController, LoginRequest};
//!
//! let config = SessionConfig::new("https://api.example.com")
//!     .with_state_dir("/var/lib/myapp/session");
//! let controller = SessionController::from_config(&config).await?;
//!
//! // Page-reload case: trust whatever the previous run stored
//! controller.restore_session().await;
//!
//! if !controller.session().await.is_authenticated() {
//!     controller.login(LoginRequest {
//!         username: "alice".into(),
//!         password: "secret1".into(),
//!     }).await?;
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod actions;
pub mod config;
pub mod controller;
pub mod environment;
pub mod error;
pub mod events;
pub mod gateway;
pub mod interceptor;
pub mod providers;
pub mod reducers;
pub mod state;
pub mod stores;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use actions::SessionAction;
pub use config::SessionConfig;
pub use controller::SessionController;
pub use error::{Result, SessionError};
pub use events::SessionEvent;
pub use interceptor::ApiClient;
pub use providers::{
    AuthPayload, LoginRequest, PasswordChange, ProfileUpdate, RegisterRequest, TokenPair,
};
pub use state::{OpId, SessionPhase, SessionState, User, UserRole};
