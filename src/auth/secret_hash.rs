//! Password hashing and verification using Argon2.
//!
//! ```rust
//! use imged::auth::secret_hash::{generate_secret_hash, is_secret_valid};
//!
//! let hash = generate_secret_hash("user_password_123").unwrap();
//! assert!(is_secret_valid("user_password_123", &hash).unwrap());
//! assert!(!is_secret_valid("wrong_password", &hash).unwrap());
//! ```

use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{self, PasswordHashString, SaltString},
};
use rand::rngs::OsRng;

use super::error::Error;

/// Hashes `pw` with a random salt. The result is a PHC string that carries
/// every parameter needed for verification.
pub fn generate_secret_hash(pw: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2.hash_password(pw.as_bytes(), &salt)?.to_string())
}

/// Verifies `pw` against a stored PHC hash.
///
/// A malformed hash is an error; a wrong password is `Ok(false)`.
pub fn is_secret_valid(pw: &str, hash: &str) -> Result<bool, Error> {
    let hash = PasswordHashString::new(hash)?;

    Ok(Argon2::default()
        .verify_password(pw.as_bytes(), &hash.password_hash())
        .is_ok())
}

impl From<password_hash::Error> for Error {
    fn from(value: password_hash::Error) -> Self {
        Self::PasswordHash(value)
    }
}
