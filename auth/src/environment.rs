//! Session environment.
//!
//! This module defines the environment type for dependency injection in
//! the session reducer.

use crate::providers::AuthGateway;
use crate::stores::CredentialHandle;

/// Session environment.
///
/// Contains the external dependencies the session reducer needs: the
/// network gateway (for the best-effort server logout effect) and the
/// credential writer handle (for enqueuing storage writes inside commit
/// transitions).
///
/// # Type Parameters
///
/// - `G`: Auth gateway
#[derive(Clone)]
pub struct SessionEnvironment<G>
where
    G: AuthGateway + Clone,
{
    /// Auth gateway.
    pub gateway: G,

    /// Handle to the credential writer funnel.
    pub credentials: CredentialHandle,
}

impl<G> SessionEnvironment<G>
where
    G: AuthGateway + Clone,
{
    /// Create a new session environment.
    #[must_use]
    pub fn new(gateway: G, credentials: CredentialHandle) -> Self {
        Self {
            gateway,
            credentials,
        }
    }
}
