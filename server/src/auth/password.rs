use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::{error, warn};

use shared::types::server_config::AuthConfig;

use crate::database::utils::generate_uuid_token;

#[derive(Debug, Error)]
pub enum HashError {
    /// Opaque on purpose: the cause is logged, never returned to a client.
    #[error("password hashing failed")]
    HashingFailed,
}

/// One-way salted password hashing with a fixed Argon2id work factor.
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Params,
    /// Digest of a random secret under the same params. Checking a login
    /// for an unknown user against it costs the same as a real check.
    decoy: Arc<str>,
}

impl CredentialHasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, HashError> {
        let params = Params::new(memory_kib, iterations, parallelism, None).map_err(|e| {
            error!("Invalid Argon2 parameters: {}", e);
            HashError::HashingFailed
        })?;
        let mut hasher = Self {
            params,
            decoy: Arc::from(""),
        };
        hasher.decoy = hasher.hash(&generate_uuid_token())?.into();
        Ok(hasher)
    }

    pub fn from_config(auth: &AuthConfig) -> Result<Self, HashError> {
        Self::new(
            auth.hash_memory_kib,
            auth.hash_iterations,
            auth.hash_parallelism,
        )
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash `password` into a PHC string (algorithm, params and salt inline).
    pub fn hash(&self, password: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                error!("Password hashing failed: {}", e);
                HashError::HashingFailed
            })
    }

    /// `true` when `password` matches `digest`.
    ///
    /// A digest that cannot be parsed is a mismatch, not an error: the
    /// caller only ever reports "wrong credentials".
    pub fn verify(&self, digest: &str, password: &str) -> bool {
        let parsed = match PasswordHash::new(digest) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Stored password hash is unreadable: {}", e);
                return false;
            }
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// Spend one verification on `password` for an account that does not
    /// exist. Always `false`.
    pub async fn verify_absent_async(&self, password: String) -> bool {
        let _ = self.verify_async(self.decoy.to_string(), password).await;
        false
    }

    /// [`hash`](Self::hash) on the blocking pool.
    pub async fn hash_async(&self, password: String) -> Result<String, HashError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| {
                error!("Hashing task failed: {}", e);
                HashError::HashingFailed
            })?
    }

    /// [`verify`](Self::verify) on the blocking pool.
    pub async fn verify_async(&self, digest: String, password: String) -> bool {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&digest, &password))
            .await
            .unwrap_or_else(|e| {
                error!("Verification task failed: {}", e);
                false
            })
    }
}
