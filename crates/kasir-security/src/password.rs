//! Password hashing with Argon2

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use kasir_shared::constants::{TEMP_PASSWORD_LENGTH, TEMP_PASSWORD_PREFIX};
use rand::{distr::Alphanumeric, Rng};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Hash error: {0}")]
    HashError(String),
}

pub struct PasswordService;

impl PasswordService {
    pub fn hash(password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PasswordError::HashError(e.to_string()))
    }

    pub fn verify(password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PasswordError::HashError(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Like [`verify`](Self::verify) but an unparseable hash counts as a mismatch.
    pub fn matches(password: &str, hash: &str) -> bool {
        Self::verify(password, hash).unwrap_or(false)
    }

    /// One-time password handed out by an admin reset, e.g. `SJ4K7QZP`.
    pub fn generate_temporary() -> String {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(TEMP_PASSWORD_LENGTH)
            .map(|b| char::from(b).to_ascii_uppercase())
            .collect();
        format!("{}{}", TEMP_PASSWORD_PREFIX, suffix)
    }
}
