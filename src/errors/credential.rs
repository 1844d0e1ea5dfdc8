use thiserror::Error;

/// Failures reported by the credential service.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Not authorized to access this route - no token provided")]
    Missing,

    #[error("Invalid token")]
    Invalid,

    #[error("Token has expired")]
    Expired,

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error("Password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

impl CredentialError {
    /// Whether the caller should see this as a 401 rather than a server fault.
    pub fn is_client_fault(&self) -> bool {
        matches!(self, Self::Missing | Self::Invalid | Self::Expired)
    }
}
