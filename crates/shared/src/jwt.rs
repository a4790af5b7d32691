//! Verification of requester access tokens.
//!
//! Access tokens are minted by the external identity service. This module only
//! verifies them and extracts the requesting user. RS256 with the identity
//! service's public key is the production setup; HS256 with a shared secret is
//! accepted for local development and tests.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Default leeway in seconds for clock skew tolerance.
pub const DEFAULT_LEEWAY_SECS: u64 = 30;

/// Error type for JWT operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JwtError {
    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Invalid subject claim")]
    InvalidSubject,

    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("Failed to decode token: {0}")]
    DecodingError(String),
}

/// Claims this service relies on. Other claims are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
}

/// Verifies bearer tokens and resolves the requesting user.
#[derive(Clone)]
pub struct AccessTokenVerifier {
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    leeway_secs: u64,
}

impl std::fmt::Debug for AccessTokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenVerifier")
            .field("algorithm", &self.algorithm)
            .field("leeway_secs", &self.leeway_secs)
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl AccessTokenVerifier {
    /// Creates a verifier from an RSA public key in PEM format.
    pub fn rs256(public_key_pem: &str, leeway_secs: u64) -> Result<Self, JwtError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| JwtError::InvalidKey(format!("Invalid public key: {}", e)))?;

        Ok(Self {
            decoding_key,
            algorithm: Algorithm::RS256,
            leeway_secs,
        })
    }

    /// Creates a verifier from a shared HMAC secret.
    pub fn hs256(secret: &str, leeway_secs: u64) -> Result<Self, JwtError> {
        if secret.is_empty() {
            return Err(JwtError::InvalidKey("HS256 secret is empty".to_string()));
        }

        Ok(Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            algorithm: Algorithm::HS256,
            leeway_secs,
        })
    }

    /// Validates a token and returns its claims.
    pub fn validate(&self, token: &str) -> Result<AccessClaims, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.leeway = self.leeway_secs;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data =
            decode::<AccessClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                    jsonwebtoken::errors::ErrorKind::InvalidToken
                    | jsonwebtoken::errors::ErrorKind::InvalidSignature
                    | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => JwtError::InvalidToken,
                    _ => JwtError::DecodingError(e.to_string()),
                }
            })?;

        Ok(token_data.claims)
    }

    /// Validates a token and returns the user ID from its subject.
    pub fn authenticate(&self, token: &str) -> Result<Uuid, JwtError> {
        let claims = self.validate(token)?;
        Uuid::parse_str(&claims.sub).map_err(|_| JwtError::InvalidSubject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test_secret_key_for_jwt_testing_12345";

    fn sign(sub: &str, exp_offset_secs: i64, secret: &str) -> String {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: sub.to_string(),
            exp: (now + Duration::seconds(exp_offset_secs)).timestamp(),
            iat: now.timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_authenticate_returns_subject() {
        let verifier = AccessTokenVerifier::hs256(SECRET, 0).unwrap();
        let user_id = Uuid::new_v4();
        let token = sign(&user_id.to_string(), 300, SECRET);

        assert_eq!(verifier.authenticate(&token).unwrap(), user_id);
    }

    #[test]
    fn test_expired_token() {
        let verifier = AccessTokenVerifier::hs256(SECRET, 0).unwrap();
        let token = sign(&Uuid::new_v4().to_string(), -120, SECRET);

        assert_eq!(verifier.validate(&token).unwrap_err(), JwtError::TokenExpired);
    }

    #[test]
    fn test_leeway_accepts_recently_expired_token() {
        let verifier = AccessTokenVerifier::hs256(SECRET, 600).unwrap();
        let token = sign(&Uuid::new_v4().to_string(), -120, SECRET);

        assert!(verifier.validate(&token).is_ok());
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let verifier = AccessTokenVerifier::hs256(SECRET, 0).unwrap();
        let token = sign(&Uuid::new_v4().to_string(), 300, "another_secret_entirely_123456");

        assert_eq!(verifier.validate(&token).unwrap_err(), JwtError::InvalidToken);
    }

    #[test]
    fn test_non_uuid_subject() {
        let verifier = AccessTokenVerifier::hs256(SECRET, 0).unwrap();
        let token = sign("not-a-user-id", 300, SECRET);

        assert_eq!(
            verifier.authenticate(&token).unwrap_err(),
            JwtError::InvalidSubject
        );
    }

    #[test]
    fn test_garbage_token() {
        let verifier = AccessTokenVerifier::hs256(SECRET, 0).unwrap();
        assert!(verifier.validate("not.a.jwt").is_err());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            AccessTokenVerifier::hs256("", 0),
            Err(JwtError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_invalid_rsa_key_rejected() {
        assert!(matches!(
            AccessTokenVerifier::rs256("not a pem", 0),
            Err(JwtError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let verifier = AccessTokenVerifier::hs256(SECRET, 0).unwrap();
        let debug = format!("{:?}", verifier);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains(SECRET));
    }
}
