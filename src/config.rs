//! Client configuration loaded from environment variables.
//!
//! All settings come from environment variables (or a `.env` file via
//! `dotenvy`). Timings are plain [`Duration`]s so embedders and tests can
//! shrink them.

use std::fmt;
use std::time::Duration;

use url::Url;

use crate::error::ClientError;

/// Engine.IO endpoint path appended to the base URL's host.
pub const SOCKET_PATH: &str = "/socket.io/";

/// Query selecting protocol revision 4 over a raw WebSocket.
pub const SOCKET_QUERY: &str = "EIO=4&transport=websocket";

/// Top-level client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the instance, e.g. `http://localhost:3001`.
    pub base_url: String,

    /// Login user name.
    pub username: String,

    /// Login password.
    pub password: String,

    /// How long a correlated call waits for its acknowledgment.
    pub call_timeout: Duration,

    /// Pause after the namespace connect marker is written.
    pub handshake_settle: Duration,

    /// Pause after login so the initial pushes can populate the caches.
    pub login_settle: Duration,

    /// Upper bound on waiting for the push that answers a refresh.
    pub refresh_settle: Duration,

    /// Pause after a monitor mutation before trusting the cache.
    pub mutation_settle: Duration,

    /// Cache polls spent looking for a notification mutation.
    pub poll_attempts: u32,

    /// Delay between two notification polls.
    pub poll_interval: Duration,

    /// Capacity of the cache update broadcast channel.
    pub cache_bus_capacity: usize,
}

impl ClientConfig {
    /// Builds a configuration with default timings.
    #[must_use]
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            call_timeout: Duration::from_secs(30),
            handshake_settle: Duration::from_millis(100),
            login_settle: Duration::from_secs(1),
            refresh_settle: Duration::from_secs(1),
            mutation_settle: Duration::from_millis(500),
            poll_attempts: 10,
            poll_interval: Duration::from_millis(500),
            cache_bus_capacity: 64,
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// Falls back to the defaults of [`ClientConfig::new`] when a variable
    /// is not set. Calls `dotenvy::dotenv().ok()` to optionally load a
    /// `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if `UPTIMEKUMA_URL` is set but is
    /// not a usable `http(s)` URL.
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("UPTIMEKUMA_URL")
            .unwrap_or_else(|_| "http://localhost:3001".to_string());
        let username = std::env::var("UPTIMEKUMA_USERNAME").unwrap_or_else(|_| "admin".to_string());
        let password = std::env::var("UPTIMEKUMA_PASSWORD").unwrap_or_default();

        let defaults = Self::new(base_url, username, password);
        let config = Self {
            call_timeout: Duration::from_secs(parse_env(
                "KUMA_CALL_TIMEOUT_SECS",
                defaults.call_timeout.as_secs(),
            )),
            handshake_settle: parse_env_millis("KUMA_HANDSHAKE_SETTLE_MS", defaults.handshake_settle),
            login_settle: parse_env_millis("KUMA_LOGIN_SETTLE_MS", defaults.login_settle),
            refresh_settle: parse_env_millis("KUMA_REFRESH_SETTLE_MS", defaults.refresh_settle),
            mutation_settle: parse_env_millis("KUMA_MUTATION_SETTLE_MS", defaults.mutation_settle),
            poll_attempts: parse_env("KUMA_POLL_ATTEMPTS", defaults.poll_attempts),
            poll_interval: parse_env_millis("KUMA_POLL_INTERVAL_MS", defaults.poll_interval),
            cache_bus_capacity: parse_env("KUMA_CACHE_BUS_CAPACITY", defaults.cache_bus_capacity),
            ..defaults
        };
        config.socket_url()?;
        Ok(config)
    }

    /// Derives the Socket.IO WebSocket endpoint from the base URL.
    ///
    /// `https` maps to `wss`, everything else to `ws`. Only the host and
    /// port of the base URL are kept.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Config`] if the base URL does not parse or
    /// has no host.
    pub fn socket_url(&self) -> Result<Url, ClientError> {
        let base = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Config(format!("invalid URL `{}`: {e}", self.base_url)))?;
        let host = base
            .host_str()
            .ok_or_else(|| ClientError::Config(format!("URL `{}` has no host", self.base_url)))?;
        let scheme = if base.scheme() == "https" { "wss" } else { "ws" };
        let authority = match base.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        Url::parse(&format!("{scheme}://{authority}{SOCKET_PATH}?{SOCKET_QUERY}"))
            .map_err(|e| ClientError::Config(format!("invalid socket URL: {e}")))
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("call_timeout", &self.call_timeout)
            .field("handshake_settle", &self.handshake_settle)
            .field("login_settle", &self.login_settle)
            .field("refresh_settle", &self.refresh_settle)
            .field("mutation_settle", &self.mutation_settle)
            .field("poll_attempts", &self.poll_attempts)
            .field("poll_interval", &self.poll_interval)
            .field("cache_bus_capacity", &self.cache_bus_capacity)
            .finish()
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parses an environment variable holding milliseconds.
fn parse_env_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .map_or(default, Duration::from_millis)
}
