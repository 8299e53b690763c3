//! Domain errors

use thiserror::Error;

use crate::repositories::StorageError;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Unknown username, inactive account and wrong password all collapse
    /// into this one variant so callers cannot enumerate usernames.
    #[error("Username atau password salah")]
    InvalidCredentials,

    #[error("Belum login")]
    NotAuthenticated,

    #[error("User tidak ditemukan")]
    UserNotFound,

    #[error("Password lama salah")]
    WrongOldPassword,

    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Password hash error: {0}")]
    PasswordHashError(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<validator::ValidationErrors> for DomainError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .next()
            .unwrap_or_else(|| errors.to_string());
        DomainError::Validation(message)
    }
}

impl From<kasir_security::PasswordError> for DomainError {
    fn from(e: kasir_security::PasswordError) -> Self {
        DomainError::PasswordHashError(e.to_string())
    }
}
