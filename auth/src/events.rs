//! Session events surfaced to the application layer.
//!
//! The interceptor and controller never navigate or touch the UI; they
//! raise events on a broadcast channel and the top-level application layer
//! decides what to do (typically: redirect to the login page).

use serde::{Deserialize, Serialize};

/// Out-of-band session notification for the application layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The session was torn down because the backend rejected its
    /// credentials and they could not be refreshed. Subscribers should
    /// send the user to the login screen; no error banner is warranted.
    AuthorizationExpired,
}
