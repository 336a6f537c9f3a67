//! Secret hashing and generation for stored credentials.

use argon2::Argon2;
use argon2::password_hash::{
    Error as PhcError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    rand_core::OsRng,
};
use rand::RngExt;
use rand::distr::Alphanumeric;

use scivault_core::{AppError, AppResult};

/// Produces and checks the secret material the identity store keeps.
///
/// Hashes are Argon2id in PHC string form, salt and parameters included,
/// so a stored hash verifies without any side configuration. A candidate
/// that simply does not match is `Ok(false)`, not an error; the store
/// decides what a failed check means.
pub struct SecretHasher {
    engine: Argon2<'static>,
}

impl SecretHasher {
    /// Creates a hasher with the Argon2id defaults.
    pub fn new() -> Self {
        Self {
            engine: Argon2::default(),
        }
    }

    /// Hashes `secret` under a fresh random salt.
    pub fn hash_secret(&self, secret: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        match self.engine.hash_password(secret.as_bytes(), &salt) {
            Ok(phc) => Ok(phc.to_string()),
            Err(e) => Err(AppError::internal(format!("Could not hash secret: {e}"))),
        }
    }

    /// Checks `candidate` against a stored PHC hash string.
    pub fn secret_matches(&self, candidate: &str, stored: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(stored).map_err(|e| {
            AppError::internal(format!("Stored credential hash is unreadable: {e}"))
        })?;
        match self.engine.verify_password(candidate.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PhcError::Password) => Ok(false),
            Err(e) => Err(AppError::internal(format!("Credential check errored: {e}"))),
        }
    }

    /// Generates a fresh alphanumeric secret for credential rotation.
    pub fn generate_secret(&self, length: usize) -> String {
        rand::rng()
            .sample_iter(Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }
}

impl std::fmt::Debug for SecretHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretHasher").finish_non_exhaustive()
    }
}

impl Default for SecretHasher {
    fn default() -> Self {
        Self::new()
    }
}
