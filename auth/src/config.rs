//! Session subsystem configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the concrete gateway, credential store, and API client.
///
/// The library reads no environment variables; binaries construct this
/// explicitly and own whatever configuration sources they like.
///
/// # Examples
///
/// ```
/// # use sessionkit_auth::SessionConfig;
/// # use std::time::Duration;
/// let config = SessionConfig::new("https://api.example.com")
///     .with_state_dir("/var/lib/myapp/session")
///     .with_request_timeout(Duration::from_secs(10));
/// assert_eq!(config.base_url, "https://api.example.com");
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend base URL (no trailing slash).
    pub base_url: String,

    /// Directory holding the durable credential keys.
    pub state_dir: PathBuf,

    /// Per-request timeout for gateway and API calls.
    pub request_timeout: Duration,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl SessionConfig {
    /// Create a configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            state_dir: PathBuf::from(".session"),
            request_timeout: Duration::from_secs(30),
            user_agent: concat!("sessionkit/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Set the durable state directory.
    #[must_use]
    pub fn with_state_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.state_dir = dir.into();
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the `User-Agent` header value.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
