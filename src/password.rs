use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};

use crate::error::{AppError, Result};

/// Generates a new password hash using argon2.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash {
            message: e.to_string(),
        })
}

/// Uses argon2 to verify the password hash against the provided password.
pub fn verify_password(password_hash: &str, password: &str) -> bool {
    let hash = match PasswordHash::new(password_hash) {
        Ok(hash) => hash,
        Err(err) => {
            tracing::error!("failed to parse password hash: {}", err);
            return false;
        }
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &hash)
        .is_ok()
}

/// [`hash_password`] on the blocking pool so argon2 does not stall the runtime
pub async fn hash_password_task(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal {
            message: format!("password hashing task failed: {}", e),
        })?
}

/// [`verify_password`] on the blocking pool
pub async fn verify_password_task(password_hash: String, password: String) -> bool {
    match tokio::task::spawn_blocking(move || verify_password(&password_hash, &password)).await {
        Ok(verified) => verified,
        Err(err) => {
            tracing::error!("password verification task failed: {}", err);
            false
        }
    }
}
