//! Auth gateway trait.
//!
//! Pure request/response mapping to the backend, independent of how
//! results are stored. No retry logic lives here - retries, if any, belong
//! to the interceptor or caller.

use super::{AuthPayload, LoginRequest, PasswordChange, ProfileUpdate, RegisterRequest, TokenPair};
use crate::error::Result;
use crate::state::User;

/// Network operations against the auth backend.
///
/// Implementations take explicit token arguments for the endpoints that
/// require authentication; the gateway holds no session state of its own.
///
/// # Error Mapping
///
/// Every method fails with a normalized [`crate::SessionError`]:
/// `InvalidCredentials`, `Validation` (field-level), `Network` (transport),
/// or `Server` (5xx). The refresh endpoint maps a rejected refresh token to
/// `AuthorizationExpired`.
pub trait AuthGateway: Send + Sync {
    /// `POST /auth/login`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` when the backend rejects the
    /// username/password pair.
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl std::future::Future<Output = Result<AuthPayload>> + Send;

    /// `POST /auth/register`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` with the offending field when the backend
    /// rejects the form data.
    fn register(
        &self,
        request: &RegisterRequest,
    ) -> impl std::future::Future<Output = Result<AuthPayload>> + Send;

    /// `POST /auth/logout`.
    ///
    /// Best-effort server-side cleanup; callers must not surface failures
    /// to the user.
    ///
    /// # Errors
    ///
    /// Returns `Network`/`Server` on failure; the caller logs and moves on.
    fn logout(
        &self,
        access_token: Option<&str>,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// `POST /auth/refresh`.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationExpired` when the refresh token itself is
    /// rejected.
    fn refresh(
        &self,
        refresh_token: &str,
    ) -> impl std::future::Future<Output = Result<TokenPair>> + Send;

    /// `GET /auth/me`.
    ///
    /// # Errors
    ///
    /// Returns `AuthorizationExpired` when the access token is rejected.
    fn current_user(
        &self,
        access_token: &str,
    ) -> impl std::future::Future<Output = Result<User>> + Send;

    /// `PUT /users/{id}/profile`.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for rejected fields, `AuthorizationExpired`
    /// for a rejected token.
    fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
        access_token: &str,
    ) -> impl std::future::Future<Output = Result<User>> + Send;

    /// `PUT /users/{id}/password`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidCredentials` when the current password is wrong.
    fn change_password(
        &self,
        user_id: &str,
        change: &PasswordChange,
        access_token: &str,
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
