//! Concrete gateway implementations.

pub mod http;

pub use http::HttpAuthGateway;
