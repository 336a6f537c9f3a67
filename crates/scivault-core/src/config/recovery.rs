//! Credential-recovery configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the unauthenticated password-reset flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Whether self-service credential recovery is enabled at all.
    /// When disabled, every reset request is rejected.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Maximum number of reset-request records retained for audit.
    #[serde(default = "default_log_entries")]
    pub max_log_entries: usize,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_log_entries: default_log_entries(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_entries() -> usize {
    256
}
