//! Request interceptor chain.
//!
//! Wraps every outgoing API call of the wider application (event lists,
//! bookings, …):
//!
//! - **Outgoing hook**: attaches `Authorization: Bearer <accessToken>`
//!   read from the Credential Store. Requests made while no token is
//!   present go out unauthenticated - avoiding that is the caller's
//!   responsibility when the endpoint requires auth.
//! - **Incoming hook**: on a 401-class response the interceptor runs the
//!   controller's single-flight token refresh and retries the original
//!   request once with the new token. If the refresh fails (or the retry
//!   is rejected again), it triggers exactly-once session teardown and
//!   raises [`crate::SessionEvent::AuthorizationExpired`] for the
//!   application layer - the interceptor itself never navigates.
//!
//! The refresh endpoint cannot recurse into this path: only the gateway
//! talks to `/auth/refresh`, and the gateway does not go through the
//! interceptor.

use crate::config::SessionConfig;
use crate::controller::SessionController;
use crate::error::{Result, SessionError};
use crate::providers::AuthGateway;
use reqwest::{Method, StatusCode};
use std::sync::Arc;

/// HTTP client for authenticated application requests.
#[derive(Debug, Clone)]
pub struct ApiClient<G>
where
    G: AuthGateway + Clone + Send + Sync + 'static,
{
    http: reqwest::Client,
    base_url: String,
    controller: Arc<SessionController<G>>,
}

impl<G> ApiClient<G>
where
    G: AuthGateway + Clone + Send + Sync + 'static,
{
    /// Build the client from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Network` if the HTTP client cannot be constructed.
    pub fn new(config: &SessionConfig, controller: Arc<SessionController<G>>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SessionError::Network(format!("build http client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            controller,
        })
    }

    /// `GET` a backend path.
    ///
    /// # Errors
    ///
    /// `Network` for transport failures, `AuthorizationExpired` after a
    /// failed refresh-and-retry. Other statuses are returned as-is for the
    /// caller to interpret.
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        self.execute(Method::GET, path, None).await
    }

    /// `POST` a JSON body to a backend path.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::get`].
    pub async fn post(&self, path: &str, body: serde_json::Value) -> Result<reqwest::Response> {
        self.execute(Method::POST, path, Some(body)).await
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let token = self.stored_access_token().await;
        let response = self
            .dispatch(method.clone(), path, body.as_ref(), token.as_deref())
            .await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!(path, "authorization failure; attempting token refresh");
        match self.controller.refresh_session().await {
            Ok(new_token) => {
                // One retry with the fresh token, never more
                let retry = self
                    .dispatch(method, path, body.as_ref(), Some(&new_token))
                    .await?;
                if retry.status() == StatusCode::UNAUTHORIZED {
                    self.controller.handle_authorization_failure().await;
                    return Err(SessionError::AuthorizationExpired);
                }
                Ok(retry)
            },
            Err(error) => {
                tracing::debug!(%error, path, "token refresh failed; tearing down");
                self.controller.handle_authorization_failure().await;
                Err(SessionError::AuthorizationExpired)
            },
        }
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
        token: Option<&str>,
    ) -> Result<reqwest::Response> {
        let mut request = self.http.request(method, format!("{}{path}", self.base_url));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        request
            .send()
            .await
            .map_err(|e| SessionError::Network(e.to_string()))
    }

    /// The access token as the Credential Store currently holds it.
    async fn stored_access_token(&self) -> Option<String> {
        match self.controller.credentials().load().await {
            Ok(stored) => stored.access_token,
            Err(error) => {
                tracing::debug!(%error, "credential load failed; sending unauthenticated");
                None
            },
        }
    }
}
