/// Password encryption using Argon2id
///
/// Passwords are never persisted in plaintext. Every write path for a user
/// password goes through [`encrypt_password`] before the value reaches a store,
/// and login attempts are checked with [`verify_password`].
///
/// # Parameters
///
/// - **Algorithm**: Argon2id
/// - **Memory**: 64 MB (65536 KB)
/// - **Iterations**: 3 passes
/// - **Parallelism**: 4 lanes
/// - **Output**: 32-byte hash, PHC string format with a random 16-byte salt
///
/// # Empty input
///
/// The empty string is passed through untransformed: `encrypt_password("")`
/// returns `""`. An empty stored value never verifies.
///
/// # Example
///
/// ```
/// use taskboard_core::auth::password::{encrypt_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stored = encrypt_password("super_secret_password_123")?;
/// assert_ne!(stored, "super_secret_password_123");
///
/// assert!(verify_password("super_secret_password_123", &stored)?);
/// assert!(!verify_password("wrong_password", &stored)?);
///
/// assert_eq!(encrypt_password("")?, "");
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Error type for password operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Stored value is not a PHC hash string
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(65536)
        .t_cost(3)
        .p_cost(4)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Transforms a plaintext password into its stored form
///
/// Returns a PHC string (`$argon2id$v=19$m=65536,t=3,p=4$...`). Two calls with
/// the same input produce different outputs because each uses a fresh salt.
///
/// The empty string is returned as-is.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn encrypt_password(password: &str) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Ok(String::new());
    }

    let salt = SaltString::generate(&mut OsRng);

    let digest = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(digest.to_string())
}

/// Checks a login attempt against a stored password
///
/// Verification is constant-time. Parameters are read from the stored PHC
/// string, so hashes produced with older parameters still verify.
///
/// # Returns
///
/// `Ok(true)` if the password matches, `Ok(false)` if it doesn't or if the
/// stored value is empty
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if `stored` is neither empty nor a PHC
/// string, and `PasswordError::VerifyError` for any other verification failure
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    if stored.is_empty() {
        return Ok(false);
    }

    let parsed = PasswordHash::new(stored)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_password() {
        let stored = encrypt_password("test_password_123").expect("Hash should succeed");

        assert!(stored.starts_with("$argon2id$"));
        assert!(stored.contains("v=19"));
        assert!(stored.contains("m=65536"));
        assert!(stored.contains("t=3"));
        assert!(stored.contains("p=4"));
        assert!(!stored.contains("test_password_123"));
    }

    #[test]
    fn test_encrypt_password_empty_passes_through() {
        assert_eq!(encrypt_password("").unwrap(), "");
    }

    #[test]
    fn test_encrypt_password_produces_different_salts() {
        let first = encrypt_password("same_password").unwrap();
        let second = encrypt_password("same_password").unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password_correct() {
        let stored = encrypt_password("correct_password").unwrap();
        assert!(verify_password("correct_password", &stored).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let stored = encrypt_password("correct_password").unwrap();
        assert!(!verify_password("wrong_password", &stored).unwrap());
        assert!(!verify_password("", &stored).unwrap());
    }

    #[test]
    fn test_verify_against_empty_stored_value() {
        assert!(!verify_password("", "").unwrap());
        assert!(!verify_password("anything", "").unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        assert!(matches!(
            verify_password("password", "plaintext"),
            Err(PasswordError::InvalidHash(_))
        ));
        assert!(verify_password("password", "$argon2id$invalid").is_err());
    }

    #[test]
    fn test_unicode_password() {
        let stored = encrypt_password("unicode-密码-パスワード").unwrap();
        assert!(verify_password("unicode-密码-パスワード", &stored).unwrap());
    }
}
