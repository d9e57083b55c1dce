//! Configuration structures for the data source.
//!
//! Loading these values from files or user preferences is up to the host
//! application; the core only depends on the typed shapes below.  All fields
//! carry serde defaults so a partially specified configuration deserializes
//! into something usable.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reconnection behaviour after a transient transport failure.
///
/// Immutable for the lifetime of one playback session; a new `start()`
/// request supplies a fresh policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum consecutive failed attempts before the session is declared
    /// irrecoverably lost.
    #[serde(default = "RetryPolicy::default_max_retries")]
    pub max_retries: u32,
    /// Wait between attempts, in seconds.
    #[serde(default = "RetryPolicy::default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl RetryPolicy {
    const fn default_max_retries() -> u32 {
        4
    }

    const fn default_retry_delay_secs() -> u64 {
        10
    }

    /// Retry delay as a `Duration`
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::default_max_retries(),
            retry_delay_secs: Self::default_retry_delay_secs(),
        }
    }
}

/// Transport level tuning.
///
/// Every connect and read the core performs is bounded by one of these
/// timeouts so a stalled server is detected instead of hanging the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Maximum time to establish the connection and receive response headers.
    #[serde(default = "TransportConfig::default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Maximum time to wait for the next chunk of the response body.
    #[serde(default = "TransportConfig::default_read_timeout_secs")]
    pub read_timeout_secs: u64,
    /// User agent announced to the radio server.
    #[serde(default = "TransportConfig::default_user_agent")]
    pub user_agent: String,
}

impl TransportConfig {
    const fn default_connect_timeout_secs() -> u64 {
        10
    }

    const fn default_read_timeout_secs() -> u64 {
        15
    }

    fn default_user_agent() -> String {
        concat!("icysource/", env!("CARGO_PKG_VERSION")).to_string()
    }

    /// Connect timeout as a `Duration`
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Read timeout as a `Duration`
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: Self::default_connect_timeout_secs(),
            read_timeout_secs: Self::default_read_timeout_secs(),
            user_agent: Self::default_user_agent(),
        }
    }
}
