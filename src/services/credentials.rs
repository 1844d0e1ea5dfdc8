//! Password hashing and session tokens.

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::config::AuthConfig;
use crate::errors::CredentialError;
use crate::models::{Claim, Role, User};

/// JWT payload carried by every session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenClaims {
    sub: String,
    role: Role,
    iss: String,
    iat: i64,
    exp: i64,
}

pub struct CredentialService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl_secs: i64,
    bcrypt_cost: u32,
}

impl CredentialService {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            issuer: config.issuer.clone(),
            ttl_secs: i64::try_from(config.token_ttl_secs).unwrap_or(i64::MAX),
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    pub fn hash_password(&self, plain: &str) -> Result<String, CredentialError> {
        Ok(hash(plain.as_bytes(), self.bcrypt_cost)?)
    }

    pub fn verify_password(&self, plain: &str, password_hash: &str) -> Result<bool, CredentialError> {
        Ok(verify(plain.as_bytes(), password_hash)?)
    }

    /// Issue a signed session token for `user`.
    pub fn issue(&self, user: &User) -> Result<String, CredentialError> {
        let now = Utc::now().timestamp();
        self.sign(&TokenClaims {
            sub: user.id.to_string(),
            role: user.role,
            iss: self.issuer.clone(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        })
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String, CredentialError> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| CredentialError::Signing(e.to_string()))
    }

    /// Check signature, issuer and expiry, and extract the claim.
    pub fn verify(&self, token: &str) -> Result<Claim, CredentialError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iss"]);

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => CredentialError::Expired,
                _ => CredentialError::Invalid,
            })?;
        let subject_id = Uuid::parse_str(&data.claims.sub).map_err(|_| CredentialError::Invalid)?;
        Ok(Claim::new(subject_id, data.claims.role))
    }
}
