//! Password hashing and verification using Argon2.

use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use password_hash::rand_core::OsRng;

use crate::error::{AuthError, Result};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 20;

/// Hashes a password using Argon2id.
///
/// Returns the hashed password as a PHC string that includes the salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::PasswordHashError)?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored hash.
///
/// Returns true if the password matches, false otherwise.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed_hash) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Returns true if `value` is an Argon2 PHC string.
pub fn is_password_hash(value: &str) -> bool {
    PasswordHash::new(value).is_ok_and(|hash| hash.algorithm.as_str().starts_with("argon2"))
}

/// Checks a password chosen at registration.
///
/// Only ASCII letters and digits are allowed, 8 to 20 of them.
pub fn validate_new_password(password: &str) -> Result<()> {
    if password.is_empty() || !password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AuthError::Validation(
            "Password can only contain alphanumeric characters.".to_string(),
        ));
    }

    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&password.len()) {
        return Err(AuthError::Validation(
            "Password must be between 8 and 20 characters.".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "securepassword123";
        let hash = hash_password(password).unwrap();

        assert!(verify_password(password, &hash));
        assert!(!verify_password("wrongpassword", &hash));
        assert!(!verify_password(password, "not a hash"));
    }

    #[test]
    fn test_salted_hashes_differ() {
        let hash1 = hash_password("securepassword123").unwrap();
        let hash2 = hash_password("securepassword123").unwrap();

        assert_ne!(hash1, hash2);
        assert!(is_password_hash(&hash1));
        assert!(!is_password_hash("securepassword123"));
        assert!(!is_password_hash(""));
    }

    #[test]
    fn test_new_password_rules() {
        assert!(validate_new_password("password123").is_ok());
        assert!(validate_new_password("Abcdefgh").is_ok());
        assert!(validate_new_password("a1b2c3d4e5f6g7h8i9j0").is_ok());

        let err = validate_new_password("pass word1").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Password can only contain alphanumeric characters."
        );
        assert!(validate_new_password("").is_err());

        let err = validate_new_password("short1").unwrap_err();
        assert_eq!(err.to_string(), "Password must be between 8 and 20 characters.");
        assert!(validate_new_password("a1b2c3d4e5f6g7h8i9j0k").is_err());
    }
}
