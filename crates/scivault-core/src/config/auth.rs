//! Authentication and identity-store configuration.

use serde::{Deserialize, Serialize};

/// Authentication and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Login name of the bootstrap administrator account.
    #[serde(default = "default_root_username")]
    pub root_username: String,
    /// Initial secret for the bootstrap administrator account.
    #[serde(default = "default_root_secret")]
    pub root_secret: String,
    /// Display name of the reserved administrative group.
    #[serde(default = "default_system_group")]
    pub system_group: String,
    /// Minimum secret length accepted when registering an account.
    #[serde(default = "default_secret_min")]
    pub secret_min_length: usize,
    /// Length of generated secrets handed out by credential rotation.
    #[serde(default = "default_generated_len")]
    pub generated_secret_length: usize,
    /// Maximum failed login attempts before lockout.
    #[serde(default = "default_max_failed")]
    pub max_failed_attempts: u32,
    /// Account lockout duration in minutes.
    #[serde(default = "default_lockout")]
    pub lockout_duration_minutes: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            root_username: default_root_username(),
            root_secret: default_root_secret(),
            system_group: default_system_group(),
            secret_min_length: default_secret_min(),
            generated_secret_length: default_generated_len(),
            max_failed_attempts: default_max_failed(),
            lockout_duration_minutes: default_lockout(),
        }
    }
}

fn default_root_username() -> String {
    "root".to_string()
}

fn default_root_secret() -> String {
    "CHANGE_ME_ON_FIRST_BOOT".to_string()
}

fn default_system_group() -> String {
    "system".to_string()
}

fn default_secret_min() -> usize {
    8
}

fn default_generated_len() -> usize {
    24
}

fn default_max_failed() -> u32 {
    5
}

fn default_lockout() -> u64 {
    30
}
