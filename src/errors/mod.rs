// Error taxonomy shared by the HTTP surface, the stores and the credential service.
use thiserror::Error;

pub mod credential;
pub mod response;
pub mod store;

pub use credential::CredentialError;
pub use store::{StoreError, StoreResult};

#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or malformed input (400).
    #[error("{0}")]
    Validation(String),

    /// No, invalid or expired credentials (401).
    #[error("{0}")]
    Authentication(String),

    /// Authenticated but not allowed (403).
    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    // Token and hashing failures are sorted into 401 or 500 in the response layer.
    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Store(err.into())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Store(err.into())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AppError::Credential(err.into())
    }
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
