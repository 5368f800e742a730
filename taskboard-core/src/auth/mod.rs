/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password encryption and verification
///
/// # Example
///
/// ```
/// use taskboard_core::auth::password::{encrypt_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let stored = encrypt_password("user_password")?;
/// assert!(verify_password("user_password", &stored)?);
/// # Ok(())
/// # }
/// ```

pub mod password;
