//! Argon2 implementation of the password hashing seam.

use anyhow::{anyhow, Result};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHasher};

use super::BasePasswordHasher;

/// Hashes passwords with Argon2id and a per-password random salt.
pub struct Argon2PasswordHasher;

impl BasePasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let digest = Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|e| anyhow!("Password hashing failed: {}", e))?;
        Ok(digest.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_phc_string() {
        let digest = Argon2PasswordHasher.hash("correct horse").unwrap();
        assert!(digest.starts_with("$argon2"));
    }

    #[test]
    fn salts_are_random() {
        let a = Argon2PasswordHasher.hash("hunter2").unwrap();
        let b = Argon2PasswordHasher.hash("hunter2").unwrap();
        assert_ne!(a, b, "Same password should hash differently per salt");
    }
}
