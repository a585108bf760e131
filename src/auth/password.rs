use bcrypt::{hash, verify, DEFAULT_COST};

use crate::error::AppError;

/// One-way hash of a plaintext password, stored in `users.password`.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    Ok(hash(password, DEFAULT_COST)?)
}

/// Checks a login attempt against a stored hash.
///
/// A hash that bcrypt cannot parse is reported as a mismatch rather than an
/// error, so a corrupted row behaves like wrong credentials.
pub fn verify_password(password: &str, hashed_password: &str) -> bool {
    match verify(password, hashed_password) {
        Ok(matches) => matches,
        Err(e) => {
            log::warn!("stored password hash could not be verified: {}", e);
            false
        }
    }
}
