//! # Password Hashing
//!
//! `User.passwordHash` holds an argon2id PHC string:
//!
//! ```text
//! $argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>
//!  │         │    │               │      └─ derived key
//!  │         │    │               └─ random per-password salt
//!  │         │    └─ cost parameters (stored, so they can change later)
//!  │         └─ version
//!  └─ algorithm
//! ```

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::error::{CoreError, CoreResult};
use crate::validation::validate_password;

/// Hashes a plaintext password for storage.
///
/// Enforces the minimum length before hashing.
pub fn hash_password(password: &str) -> CoreResult<String> {
    validate_password(password)?;

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CoreError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Checks a plaintext password against a stored hash.
///
/// A malformed stored hash never verifies.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
