//! Adapter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default quiet period before a scene is written.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Default capacity of the status broadcast channel.
pub const DEFAULT_STATUS_CAPACITY: usize = 100;

/// Environment variable overriding [`SyncConfig::debounce_ms`].
pub const ENV_DEBOUNCE_MS: &str = "COMPOSER_SYNC_DEBOUNCE_MS";

/// Persistence adapter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// A scene is written once no change for it arrived for this long.
    pub debounce_ms: u64,
    /// Buffered status events per subscriber before it lags.
    pub status_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            status_capacity: DEFAULT_STATUS_CAPACITY,
        }
    }
}

impl SyncConfig {
    /// Create a configuration with a custom debounce.
    #[must_use]
    pub fn with_debounce_ms(debounce_ms: u64) -> Self {
        Self {
            debounce_ms,
            ..Self::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Environment variables:
    /// - `COMPOSER_SYNC_DEBOUNCE_MS`: debounce window in milliseconds (default: 500)
    #[must_use]
    pub fn from_env() -> Self {
        let debounce_ms = std::env::var(ENV_DEBOUNCE_MS)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_DEBOUNCE_MS);
        Self::with_debounce_ms(debounce_ms)
    }

    /// The debounce window as a duration.
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
