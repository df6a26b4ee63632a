/// Password hashing and verification using Argon2id
use argon2::{
    password_hash::{PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};

use crate::CryptoError;

/// Hash a password using Argon2id.
/// Strength is not checked here; callers validate input first.
pub fn hash_password(password: &str) -> Result<String, CryptoError> {
    let salt = SaltString::generate(rand::thread_rng());

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CryptoError::Hashing(e.to_string()))
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> Result<(), CryptoError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| CryptoError::Hashing(e.to_string()))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| CryptoError::InvalidCredentials)
}

/// Requirements:
/// - Minimum 8 characters
/// - At least one uppercase letter
/// - At least one lowercase letter
/// - At least one digit
/// - At least one special character
pub fn validate_password_strength(password: &str) -> Result<(), CryptoError> {
    if password.chars().count() < 8 {
        return Err(CryptoError::WeakPassword("must contain at least 8 characters"));
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(CryptoError::WeakPassword("must contain an uppercase letter"));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        return Err(CryptoError::WeakPassword("must contain a lowercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(CryptoError::WeakPassword("must contain a digit"));
    }
    if !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err(CryptoError::WeakPassword("must contain a special character"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("SecurePass123!").unwrap();
        assert!(verify_password("SecurePass123!", &hash).is_ok());
    }

    #[test]
    fn test_wrong_password() {
        let hash = hash_password("SecurePass123!").unwrap();
        assert!(matches!(
            verify_password("WrongPass123!", &hash),
            Err(CryptoError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_garbage_hash_is_not_credentials_error() {
        assert!(matches!(
            verify_password("SecurePass123!", "plain"),
            Err(CryptoError::Hashing(_))
        ));
    }

    #[test]
    fn test_strength_rules() {
        assert!(validate_password_strength("SecurePass123!").is_ok());
        assert!(validate_password_strength("Pass1!").is_err());
        assert!(validate_password_strength("securepass123!").is_err());
        assert!(validate_password_strength("SECUREPASS123!").is_err());
        assert!(validate_password_strength("SecurePass!!!").is_err());
        assert!(validate_password_strength("SecurePass123").is_err());
    }
}
