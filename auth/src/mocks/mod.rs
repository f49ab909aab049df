//! Mock provider implementations for testing.
//!
//! This module provides simple, in-memory implementations of the provider
//! traits for use in unit and integration tests. Both mocks can be paused
//! at their suspend points, which is how the concurrency properties
//! (logout racing a login, restore superseded by login) are exercised
//! deterministically.

pub mod credentials;
pub mod gateway;

pub use credentials::MockCredentialStore;
pub use gateway::MockAuthGateway;
