//! Runtime settings for parsing and playback control.

use crate::error::ConfigError;
use crate::srt::ParsePolicy;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Default step used by skip forward/backward.
pub const DEFAULT_SKIP_STEP_MS: i64 = 5000;

/// Default period between simulated clock ticks.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 250;

/// Settings shared by the session and the playback controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub parse_policy: ParsePolicy,
    pub skip_step_ms: i64,
    pub tick_interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            parse_policy: ParsePolicy::Lenient,
            skip_step_ms: DEFAULT_SKIP_STEP_MS,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl SyncConfig {
    /// Defaults overlaid with `SUBSYNC_PARSE_POLICY`, `SUBSYNC_SKIP_MS` and
    /// `SUBSYNC_TICK_MS` when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup("SUBSYNC_PARSE_POLICY") {
            config.parse_policy = match value.trim().to_ascii_lowercase().as_str() {
                "strict" => ParsePolicy::Strict,
                "lenient" => ParsePolicy::Lenient,
                _ => {
                    return Err(ConfigError {
                        key: "SUBSYNC_PARSE_POLICY",
                        value,
                    })
                }
            };
        }
        if let Some(value) = lookup("SUBSYNC_SKIP_MS") {
            config.skip_step_ms = match value.trim().parse::<i64>() {
                Ok(ms) if ms > 0 => ms,
                _ => {
                    return Err(ConfigError {
                        key: "SUBSYNC_SKIP_MS",
                        value,
                    })
                }
            };
        }
        if let Some(value) = lookup("SUBSYNC_TICK_MS") {
            config.tick_interval_ms = match value.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => {
                    return Err(ConfigError {
                        key: "SUBSYNC_TICK_MS",
                        value,
                    })
                }
            };
        }
        trace!("loaded config {:?}", config);
        Ok(config)
    }
}
