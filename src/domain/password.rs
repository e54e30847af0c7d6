//! One-way password hashing.
//!
//! Plaintext passwords enter the system only through [`Password::hash`]; what
//! gets persisted is the PHC-formatted Argon2 string.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};

use crate::config::MIN_PASSWORD_LENGTH;
use crate::errors::{AppError, AppResult};

/// Hashed password ready for storage.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

impl Password {
    /// Hash a plaintext password with a fresh random salt.
    ///
    /// # Errors
    /// Returns a validation error if the password is shorter than
    /// [`MIN_PASSWORD_LENGTH`].
    pub fn hash(plain_text: &str) -> AppResult<Self> {
        if plain_text.chars().count() < MIN_PASSWORD_LENGTH as usize {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))?
            .to_string();

        Ok(Self { hash })
    }

    /// Check a plaintext candidate against a stored hash string.
    ///
    /// Malformed hashes never verify.
    #[cfg(test)]
    pub fn matches(stored_hash: &str, plain_text: &str) -> bool {
        use argon2::password_hash::{PasswordHash, PasswordVerifier};

        match PasswordHash::new(stored_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(plain_text.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    pub fn into_string(self) -> String {
        self.hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_never_contains_plaintext() {
        let password = Password::hash("SecurePassword123!").unwrap();
        assert!(!password.as_str().contains("SecurePassword123!"));
        assert!(password.as_str().starts_with("$argon2"));
    }

    #[test]
    fn test_matches() {
        let password = Password::hash("SecurePassword123!").unwrap();
        assert!(Password::matches(password.as_str(), "SecurePassword123!"));
        assert!(!Password::matches(password.as_str(), "WrongPassword123"));
    }

    #[test]
    fn test_same_password_different_salts() {
        let first = Password::hash("SamePassword123").unwrap();
        let second = Password::hash("SamePassword123").unwrap();
        assert_ne!(first.as_str(), second.as_str());
    }

    #[test]
    fn test_too_short_is_rejected() {
        assert!(matches!(
            Password::hash("short"),
            Err(AppError::Validation(_))
        ));
        assert!(Password::hash("12345678").is_ok());
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!Password::matches("not-a-phc-string", "anything"));
    }

    #[test]
    fn test_debug_is_redacted() {
        let password = Password::hash("SecurePassword123!").unwrap();
        assert_eq!(format!("{:?}", password), "Password([REDACTED])");
    }
}
