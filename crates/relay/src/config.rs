//! Relay configuration.
//!
//! Built once at startup and handed to [`RelayClient`](crate::RelayClient)
//! by value. Nothing below the client reads the environment.

use std::time::Duration;

use driveup_protocol::PayloadMode;

/// Default request timeout: 120 s.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(120_000);

pub const ENV_ENDPOINT_URL: &str = "DRIVEUP_ENDPOINT_URL";
pub const ENV_PAYLOAD_MODE: &str = "DRIVEUP_PAYLOAD_MODE";
pub const ENV_API_KEY: &str = "DRIVEUP_API_KEY";
pub const ENV_TIMEOUT_MS: &str = "DRIVEUP_TIMEOUT_MS";

/// Immutable settings for the relay client.
#[derive(Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Relay URL. Absence is reported when an upload is attempted.
    pub endpoint_url: Option<String>,
    /// Mode used when a request does not choose one.
    pub payload_mode: PayloadMode,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            payload_mode: PayloadMode::default(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// Hand-written so the API key never reaches logs.
impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("payload_mode", &self.payload_mode)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RelayConfig {
    /// Creates a config for `endpoint_url` with defaults for everything else.
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: Some(endpoint_url.into()),
            ..Self::default()
        }
    }

    /// Reads `DRIVEUP_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    ///
    /// Empty values count as unset. An unknown payload mode means base64 and
    /// an unparsable timeout means the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timeout = get(ENV_TIMEOUT_MS)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_TIMEOUT);

        Self {
            endpoint_url: get(ENV_ENDPOINT_URL),
            payload_mode: get(ENV_PAYLOAD_MODE)
                .map(|v| PayloadMode::parse_lenient(&v))
                .unwrap_or_default(),
            api_key: get(ENV_API_KEY),
            timeout,
        }
    }

    pub fn with_payload_mode(mut self, mode: PayloadMode) -> Self {
        self.payload_mode = mode;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
