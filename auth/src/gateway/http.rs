//! HTTP auth gateway.
//!
//! Maps the backend's REST endpoints into normalized payloads. The backend
//! wraps most responses in a `{ "data": … }` envelope and returns the
//! login/register payload in JWT-response form (`token`, `id`, `username`,
//! `name`, `role`, `refreshToken`); the refresh endpoint answers flat.
//! All of that stays in here - callers only ever see [`AuthPayload`],
//! [`TokenPair`], and [`User`].

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::providers::{
    AuthGateway, AuthPayload, LoginRequest, PasswordChange, ProfileUpdate, RegisterRequest,
    TokenPair,
};
use crate::state::{User, UserRole};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Auth gateway speaking JSON over HTTP via reqwest.
#[derive(Debug, Clone)]
pub struct HttpAuthGateway {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAuthGateway {
    /// Build the gateway from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Network` if the HTTP client cannot be constructed.
    pub fn new(config: &SessionConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| SessionError::Network(format!("build http client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl AuthGateway for HttpAuthGateway {
    async fn login(&self, request: &LoginRequest) -> Result<AuthPayload> {
        tracing::debug!(username = %request.username, "POST /auth/login");
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(request)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(failure(response, Challenge::Credentials).await);
        }
        let status = response.status();
        let envelope: Envelope<JwtResponse> =
            response.json().await.map_err(|e| decode(status, &e))?;
        Ok(envelope.data.into_payload())
    }

    async fn register(&self, request: &RegisterRequest) -> Result<AuthPayload> {
        tracing::debug!(username = %request.username, "POST /auth/register");
        let response = self
            .http
            .post(self.url("/auth/register"))
            .json(request)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(failure(response, Challenge::Credentials).await);
        }
        let status = response.status();
        let envelope: Envelope<JwtResponse> =
            response.json().await.map_err(|e| decode(status, &e))?;
        Ok(envelope.data.into_payload())
    }

    async fn logout(&self, access_token: Option<&str>) -> Result<()> {
        tracing::debug!("POST /auth/logout");
        let mut request = self.http.post(self.url("/auth/logout"));
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(transport)?;

        if !response.status().is_success() {
            return Err(failure(response, Challenge::Bearer).await);
        }
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair> {
        tracing::debug!("POST /auth/refresh");
        let response = self
            .http
            .post(self.url("/auth/refresh"))
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(failure(response, Challenge::Bearer).await);
        }
        let status = response.status();
        response.json().await.map_err(|e| decode(status, &e))
    }

    async fn current_user(&self, access_token: &str) -> Result<User> {
        tracing::debug!("GET /auth/me");
        let response = self
            .http
            .get(self.url("/auth/me"))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(failure(response, Challenge::Bearer).await);
        }
        let status = response.status();
        let envelope: Envelope<UserDto> =
            response.json().await.map_err(|e| decode(status, &e))?;
        Ok(envelope.data.into_user())
    }

    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        access_token: &str,
    ) -> Result<User> {
        tracing::debug!(user_id, "PUT /users/{{id}}/profile");
        let response = self
            .http
            .put(self.url(&format!("/users/{user_id}/profile")))
            .bearer_auth(access_token)
            .json(update)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(failure(response, Challenge::Bearer).await);
        }
        let status = response.status();
        let envelope: Envelope<UserDto> =
            response.json().await.map_err(|e| decode(status, &e))?;
        Ok(envelope.data.into_user())
    }

    async fn change_password(
        &self,
        user_id: &str,
        change: &PasswordChange,
        access_token: &str,
    ) -> Result<()> {
        tracing::debug!(user_id, "PUT /users/{{id}}/password");
        let response = self
            .http
            .put(self.url(&format!("/users/{user_id}/password")))
            .bearer_auth(access_token)
            .json(change)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            // A rejected current password comes back as a credential error
            return Err(failure(response, Challenge::Credentials).await);
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Wire types
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Login/register response body inside the envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JwtResponse {
    token: String,
    id: String,
    username: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Option<UserRole>,
    refresh_token: String,
}

impl JwtResponse {
    fn into_payload(self) -> AuthPayload {
        AuthPayload {
            user: User {
                id: self.id,
                email: self.username,
                display_name: self.name,
                role: self.role.unwrap_or_default(),
                created_at: None,
                updated_at: None,
            },
            access_token: self.token,
            refresh_token: self.refresh_token,
        }
    }
}

/// User record as various endpoints spell it; older backend routes use
/// `username`/`name` where newer ones use `email`/`displayName`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDto {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    role: Option<UserRole>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

impl UserDto {
    fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email.or(self.username).unwrap_or_default(),
            display_name: self.display_name.or(self.name),
            role: self.role.unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Backend error body: a top-level message and optional field errors.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<BTreeMap<String, String>>,
}

// ═══════════════════════════════════════════════════════════════════════
// Error mapping
// ═══════════════════════════════════════════════════════════════════════

/// How a 401/403 on this endpoint should be interpreted.
#[derive(Debug, Clone, Copy)]
enum Challenge {
    /// The user-supplied credentials were wrong.
    Credentials,
    /// The presented bearer/refresh token is no longer valid.
    Bearer,
}

fn transport(error: reqwest::Error) -> SessionError {
    SessionError::Network(error.to_string())
}

fn decode(status: StatusCode, error: &reqwest::Error) -> SessionError {
    tracing::error!(%status, %error, "malformed response body");
    SessionError::Server {
        status: status.as_u16(),
    }
}

async fn failure(response: reqwest::Response, challenge: Challenge) -> SessionError {
    let status = response.status();
    let body: ErrorBody = response.json().await.unwrap_or_default();
    map_failure(status.as_u16(), body, challenge)
}

fn map_failure(status: u16, body: ErrorBody, challenge: Challenge) -> SessionError {
    match status {
        401 | 403 => match challenge {
            Challenge::Credentials => SessionError::InvalidCredentials,
            Challenge::Bearer => SessionError::AuthorizationExpired,
        },
        400 | 422 => {
            if let Some((field, message)) =
                body.errors.and_then(|errors| errors.into_iter().next())
            {
                SessionError::Validation { field, message }
            } else {
                SessionError::Validation {
                    field: "request".to_string(),
                    message: body
                        .message
                        .unwrap_or_else(|| "invalid request".to_string()),
                }
            }
        },
        status => SessionError::Server { status },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn jwt_response_maps_into_payload() {
        let response: Envelope<JwtResponse> = serde_json::from_str(
            r#"{"data":{"token":"tok1","id":"1","username":"a@x.com",
                "name":"Alice","role":"organizer","refreshToken":"ref1"}}"#,
        )
        .unwrap();

        let payload = response.data.into_payload();
        assert_eq!(payload.access_token, "tok1");
        assert_eq!(payload.refresh_token, "ref1");
        assert_eq!(payload.user.id, "1");
        assert_eq!(payload.user.email, "a@x.com");
        assert_eq!(payload.user.display_name.as_deref(), Some("Alice"));
        assert_eq!(payload.user.role, UserRole::Organizer);
    }

    #[test]
    fn user_dto_falls_back_to_legacy_field_names() {
        let dto: UserDto = serde_json::from_str(
            r#"{"id":"2","username":"b@x.com","name":"Bob"}"#,
        )
        .unwrap();

        let user = dto.into_user();
        assert_eq!(user.email, "b@x.com");
        assert_eq!(user.display_name.as_deref(), Some("Bob"));
        assert_eq!(user.role, UserRole::User);
    }

    #[test]
    fn unauthorized_maps_by_challenge() {
        let err = map_failure(401, ErrorBody::default(), Challenge::Credentials);
        assert_eq!(err, SessionError::InvalidCredentials);

        let err = map_failure(401, ErrorBody::default(), Challenge::Bearer);
        assert_eq!(err, SessionError::AuthorizationExpired);
    }

    #[test]
    fn field_errors_map_to_validation() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"message":"Validation failed","errors":{"email":"already taken"}}"#,
        )
        .unwrap();

        let err = map_failure(422, body, Challenge::Credentials);
        assert_eq!(err, SessionError::Validation {
            field: "email".to_string(),
            message: "already taken".to_string(),
        });
    }

    #[test]
    fn server_errors_keep_their_status() {
        let err = map_failure(503, ErrorBody::default(), Challenge::Bearer);
        assert_eq!(err, SessionError::Server { status: 503 });
    }
}
