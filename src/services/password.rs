//! Password hashing and strength validation
//!
//! Argon2id with random salts for storage; a small strength check mirrors
//! the registration validators (length, not all numeric, contains a letter).

use anyhow::{Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::services::error::{ServiceError, ServiceResult};

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a password using Argon2id with secure defaults.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
        .context("Password hashing failed")?;

    Ok(password_hash.to_string())
}

/// Verify a password against a stored PHC-format hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))
        .context("Failed to parse password hash")?;

    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow::anyhow!("Password verification failed: {}", e))
            .context("Password verification error"),
    }
}

/// Reject weak passwords before they reach the hasher.
pub fn validate_strength(password: &str) -> ServiceResult<()> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.chars().all(|c| c.is_ascii_digit()) {
        return Err(ServiceError::validation(
            "Password cannot be entirely numeric",
        ));
    }
    if !password.chars().any(|c| c.is_alphabetic()) {
        return Err(ServiceError::validation(
            "Password must contain at least one letter",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_produces_argon2id() {
        let hash = hash_password("test_password_123").expect("Failed to hash password");
        assert!(hash.starts_with("$argon2id$"));
    }

    #[test]
    fn test_same_password_different_hashes() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();
        assert_ne!(hash1, hash2, "random salts must differ");
    }

    #[test]
    fn test_verify_round_trip() {
        let hash = hash_password("correct_password").unwrap();
        assert!(verify_password("correct_password", &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_invalid_hash_errors() {
        assert!(verify_password("password", "not_a_hash").is_err());
    }

    #[test]
    fn test_strength_validation() {
        assert!(validate_strength("short1").is_err());
        assert!(validate_strength("12345678").is_err());
        assert!(validate_strength("!!!!!!!!").is_err());
        assert!(validate_strength("passw0rd").is_ok());
        assert!(validate_strength("пароль-достаточно-длинный").is_ok());
    }
}
