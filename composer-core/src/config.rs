//! Editor configuration.

use serde::{Deserialize, Serialize};

use crate::{AspectRatio, SNAP_THRESHOLD};

/// Environment variable overriding [`EditorConfig::snap_threshold`].
pub const ENV_SNAP_THRESHOLD: &str = "COMPOSER_SNAP_THRESHOLD";
/// Environment variable overriding [`EditorConfig::aspect_ratio`].
pub const ENV_ASPECT_RATIO: &str = "COMPOSER_ASPECT_RATIO";
/// Environment variable overriding [`EditorConfig::history_limit`].
pub const ENV_HISTORY_LIMIT: &str = "COMPOSER_HISTORY_LIMIT";

/// Settings for an editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Snap distance in canvas pixels.
    pub snap_threshold: f32,
    /// Aspect ratio given to new scenes.
    pub aspect_ratio: AspectRatio,
    /// Maximum undo depth; `None` is unlimited.
    pub history_limit: Option<usize>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            snap_threshold: SNAP_THRESHOLD,
            aspect_ratio: AspectRatio::default(),
            history_limit: None,
        }
    }
}

impl EditorConfig {
    /// Create configuration from environment variables.
    ///
    /// Environment variables:
    /// - `COMPOSER_SNAP_THRESHOLD`: snap distance in pixels (default: 3)
    /// - `COMPOSER_ASPECT_RATIO`: `16:9`, `9:16`, `1:1` or `4:3` (default: 16:9)
    /// - `COMPOSER_HISTORY_LIMIT`: maximum undo depth (default: unlimited)
    ///
    /// Unparseable values fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let snap_threshold = lookup(ENV_SNAP_THRESHOLD)
            .and_then(|v| v.parse::<f32>().ok())
            .filter(|t| t.is_finite() && *t >= 0.0)
            .unwrap_or(defaults.snap_threshold);
        let aspect_ratio = lookup(ENV_ASPECT_RATIO)
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.aspect_ratio);
        let history_limit = lookup(ENV_HISTORY_LIMIT)
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|limit| *limit > 0)
            .or(defaults.history_limit);
        Self {
            snap_threshold,
            aspect_ratio,
            history_limit,
        }
    }
}
