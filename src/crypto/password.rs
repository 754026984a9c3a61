use argon2::password_hash::{self, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use rand::Rng;
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;

/// Argon2id password hashing with a configurable work factor.
///
/// Hashes are PHC strings that embed their own parameters, so verification
/// keeps working for hashes produced under an older work factor.
#[derive(Clone)]
pub struct CredentialStore {
    argon2: Argon2<'static>,
    /// Hash under the current work factor, verified when no user matches
    dummy_hash: Arc<str>,
}

/// Generate a cryptographically secure random salt
pub fn generate_salt() -> [u8; 16] {
    rand::rngs::OsRng.gen()
}

impl CredentialStore {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let params = Params::new(
            config.password_memory_kib,
            config.password_time_cost,
            Params::DEFAULT_P_COST,
            None,
        )
        .map_err(|e| AppError::Config(format!("Invalid password work factor: {}", e)))?;

        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, "unknown-user")?.into();

        Ok(Self { argon2, dummy_hash })
    }

    /// Hash a password with a fresh salt, returning the PHC string.
    pub fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        hash_with(&self.argon2, plaintext)
    }

    /// Compare a password against a stored hash.
    ///
    /// A mismatch is `Ok(false)`. A stored hash that does not parse is a
    /// data-integrity failure and surfaces as `AppError::Crypto`.
    pub fn verify(&self, plaintext: &str, stored_hash: &str) -> Result<bool, AppError> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| AppError::Crypto(format!("Malformed stored hash: {}", e)))?;

        match self.argon2.verify_password(plaintext.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::Crypto(format!("Password verification failed: {}", e))),
        }
    }

    /// Spend the same work as a real verification, for a username that
    /// does not exist. The result is discarded.
    pub async fn verify_dummy_blocking(&self, plaintext: String) -> Result<(), AppError> {
        self.verify_blocking(plaintext, self.dummy_hash.to_string())
            .await
            .map(|_| ())
    }

    /// Runs [`CredentialStore::hash`] on the blocking pool.
    pub async fn hash_blocking(&self, plaintext: String) -> Result<String, AppError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.hash(&plaintext))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
    }

    /// Runs [`CredentialStore::verify`] on the blocking pool.
    pub async fn verify_blocking(
        &self,
        plaintext: String,
        stored_hash: String,
    ) -> Result<bool, AppError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.verify(&plaintext, &stored_hash))
            .await
            .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?
    }
}

fn hash_with(argon2: &Argon2<'_>, plaintext: &str) -> Result<String, AppError> {
    let salt = SaltString::encode_b64(&generate_salt())
        .map_err(|e| AppError::Crypto(format!("Salt encoding failed: {}", e)))?;

    let hash = argon2
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| AppError::Crypto(format!("Password hashing failed: {}", e)))?;

    Ok(hash.to_string())
}
