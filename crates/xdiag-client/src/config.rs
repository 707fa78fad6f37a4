//! Client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default X API host.
pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

/// HTTP settings for [`XApiClient`](crate::XApiClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XApiConfig {
    /// API host, without the `/2` version prefix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout, in seconds when serialized
    #[serde(default = "default_timeout", with = "duration_secs")]
    pub timeout: Duration,

    /// User-Agent header value
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("xdiag/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for XApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl XApiConfig {
    /// Point the client at another host (mock servers, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Rate limit headers from an X API response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Requests allowed per window
    pub limit: Option<u32>,
    /// Requests left in the current window
    pub remaining: Option<u32>,
    /// Unix time the window resets
    pub reset: Option<u64>,
}

impl RateLimitInfo {
    /// Parse the `x-rate-limit-*` headers.
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Self {
        fn parse<T: std::str::FromStr>(
            headers: &reqwest::header::HeaderMap,
            name: &str,
        ) -> Option<T> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        }

        Self {
            limit: parse(headers, "x-rate-limit-limit"),
            remaining: parse(headers, "x-rate-limit-remaining"),
            reset: parse(headers, "x-rate-limit-reset"),
        }
    }

    /// No requests left in this window.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Seconds from `now` (unix seconds) until the window resets.
    #[must_use]
    pub fn secs_until_reset(&self, now: u64) -> Option<u64> {
        self.reset
            .and_then(|reset| reset.checked_sub(now))
            .filter(|secs| *secs > 0)
    }
}
