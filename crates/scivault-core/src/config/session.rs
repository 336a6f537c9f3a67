//! Session management configuration.

use serde::{Deserialize, Serialize};

/// Session management configuration.
///
/// All timeouts are in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Default inactivity timeout applied to sessions created by login.
    #[serde(default = "default_timeout")]
    pub default_timeout_ms: i64,
    /// Upper bound on caller-supplied session timeouts.
    #[serde(default = "default_max_timeout")]
    pub max_timeout_ms: i64,
    /// Interval between background expiry sweeps.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout(),
            max_timeout_ms: default_max_timeout(),
            sweep_interval_ms: default_sweep_interval(),
        }
    }
}

fn default_timeout() -> i64 {
    // 10 minutes of inactivity.
    600_000
}

fn default_max_timeout() -> i64 {
    // 24 hours.
    86_400_000
}

fn default_sweep_interval() -> u64 {
    1_000
}
