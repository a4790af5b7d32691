//! Signed, time-bound attendance capability tokens.
//!
//! Wire format: `base64url(payload) "." base64url(HMAC-SHA256(secret, payload))`
//! where `payload` is `event_id|expiry_epoch` for event-scoped tokens and
//! `event_id|user_id|expiry_epoch` for subject-scoped tokens. Padding is
//! stripped on encode and tolerated on decode.
//!
//! Tokens are stateless: nothing is stored at issuance, so any process holding
//! the same secret can verify them.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Minimum accepted length of the signing secret in bytes.
pub const MIN_SECRET_LEN: usize = 32;

const SEGMENT_SEPARATOR: char = '.';
const FIELD_SEPARATOR: char = '|';

const TOKEN_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Reason an attendance token was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("attendance token is malformed")]
    Malformed,

    #[error("attendance token signature is invalid")]
    BadSignature,

    #[error("attendance token has expired")]
    Expired,
}

impl TokenError {
    /// Stable machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::BadSignature => "bad_signature",
            TokenError::Expired => "expired",
        }
    }
}

/// Error building a token service from configuration.
#[derive(Debug, Error)]
pub enum TokenKeyError {
    #[error("attendance token secret must be at least 32 bytes, got {0}")]
    SecretTooShort(usize),
}

/// Fields carried by a verified token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceClaims {
    pub event_id: Uuid,
    /// Present for subject-scoped tokens only.
    pub user_id: Option<Uuid>,
    pub expires_at: DateTime<Utc>,
}

impl AttendanceClaims {
    pub fn is_subject_scoped(&self) -> bool {
        self.user_id.is_some()
    }
}

/// A freshly issued token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies attendance tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct AttendanceTokenService {
    key: HmacSha256,
}

impl std::fmt::Debug for AttendanceTokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttendanceTokenService")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl AttendanceTokenService {
    /// Creates a service from the raw signing secret.
    pub fn new(secret: &[u8]) -> Result<Self, TokenKeyError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenKeyError::SecretTooShort(secret.len()));
        }
        // HMAC accepts keys of any length, so this only fails on an empty key,
        // which the length check above already rules out.
        let key = HmacSha256::new_from_slice(secret)
            .map_err(|_| TokenKeyError::SecretTooShort(secret.len()))?;
        Ok(Self { key })
    }

    /// Issues a token valid for `ttl` starting now.
    pub fn issue(&self, event_id: Uuid, user_id: Option<Uuid>, ttl: Duration) -> IssuedToken {
        self.issue_at(event_id, user_id, ttl, Utc::now())
    }

    /// Issues a token valid for `ttl` starting at `now`.
    ///
    /// Expiry has whole-second precision; the fractional part is truncated.
    pub fn issue_at(
        &self,
        event_id: Uuid,
        user_id: Option<Uuid>,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> IssuedToken {
        let expiry = now + ttl;
        let expiry_epoch = expiry.timestamp();
        let expires_at = DateTime::from_timestamp(expiry_epoch, 0).unwrap_or(expiry);

        let payload = match user_id {
            Some(user_id) => format!("{event_id}{FIELD_SEPARATOR}{user_id}{FIELD_SEPARATOR}{expiry_epoch}"),
            None => format!("{event_id}{FIELD_SEPARATOR}{expiry_epoch}"),
        };
        let signature = self.sign(payload.as_bytes());

        let token = format!(
            "{}{}{}",
            TOKEN_ENGINE.encode(payload.as_bytes()),
            SEGMENT_SEPARATOR,
            TOKEN_ENGINE.encode(signature)
        );

        IssuedToken { token, expires_at }
    }

    /// Verifies a token against the current wall clock.
    pub fn verify(&self, token: &str) -> Result<AttendanceClaims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verifies a token against `now`. A token is expired at its expiry instant.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<AttendanceClaims, TokenError> {
        let (payload_segment, signature_segment) = token
            .trim()
            .split_once(SEGMENT_SEPARATOR)
            .ok_or(TokenError::Malformed)?;
        if payload_segment.is_empty() || signature_segment.is_empty() {
            return Err(TokenError::Malformed);
        }

        let payload = TOKEN_ENGINE
            .decode(payload_segment)
            .map_err(|_| TokenError::Malformed)?;
        let signature = TOKEN_ENGINE
            .decode(signature_segment)
            .map_err(|_| TokenError::BadSignature)?;

        let mut mac = self.key.clone();
        mac.update(&payload);
        // verify_slice compares in constant time and rejects length mismatches.
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let claims = parse_payload(&payload)?;
        if now >= claims.expires_at {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = self.key.clone();
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

fn parse_payload(payload: &[u8]) -> Result<AttendanceClaims, TokenError> {
    let text = std::str::from_utf8(payload).map_err(|_| TokenError::Malformed)?;
    let fields: Vec<&str> = text.split(FIELD_SEPARATOR).collect();

    let (event_field, user_field, expiry_field) = match fields.as_slice() {
        [event, expiry] => (*event, None, *expiry),
        [event, user, expiry] => (*event, Some(*user), *expiry),
        _ => return Err(TokenError::Malformed),
    };

    let event_id = Uuid::parse_str(event_field).map_err(|_| TokenError::Malformed)?;
    let user_id = user_field
        .map(Uuid::parse_str)
        .transpose()
        .map_err(|_| TokenError::Malformed)?;
    let expiry_epoch: i64 = expiry_field.parse().map_err(|_| TokenError::Malformed)?;
    let expires_at = DateTime::from_timestamp(expiry_epoch, 0).ok_or(TokenError::Malformed)?;

    Ok(AttendanceClaims {
        event_id,
        user_id,
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn service() -> AttendanceTokenService {
        AttendanceTokenService::new(SECRET).unwrap()
    }

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_event_scoped_token_verifies() {
        let svc = service();
        let event_id = Uuid::new_v4();
        let issued = svc.issue_at(event_id, None, Duration::minutes(10), noon());

        let claims = svc.verify_at(&issued.token, noon()).unwrap();
        assert_eq!(claims.event_id, event_id);
        assert_eq!(claims.user_id, None);
        assert!(!claims.is_subject_scoped());
        assert_eq!(claims.expires_at, noon() + Duration::minutes(10));
    }

    #[test]
    fn test_subject_scoped_token_verifies() {
        let svc = service();
        let event_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let issued = svc.issue_at(event_id, Some(user_id), Duration::minutes(5), noon());

        let claims = svc.verify_at(&issued.token, noon()).unwrap();
        assert_eq!(claims.event_id, event_id);
        assert_eq!(claims.user_id, Some(user_id));
    }

    #[test]
    fn test_payload_wire_format() {
        let svc = service();
        let event_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let issued = svc.issue_at(event_id, Some(user_id), Duration::seconds(60), noon());

        let (payload, _) = issued.token.split_once('.').unwrap();
        let decoded = String::from_utf8(TOKEN_ENGINE.decode(payload).unwrap()).unwrap();
        assert_eq!(
            decoded,
            format!("{}|{}|{}", event_id, user_id, noon().timestamp() + 60)
        );
        assert!(!issued.token.contains('='));
    }

    #[test]
    fn test_expiry_boundary_is_expired() {
        let svc = service();
        let issued = svc.issue_at(Uuid::new_v4(), None, Duration::seconds(30), noon());

        let just_before = issued.expires_at - Duration::milliseconds(1);
        assert!(svc.verify_at(&issued.token, just_before).is_ok());
        assert_eq!(
            svc.verify_at(&issued.token, issued.expires_at),
            Err(TokenError::Expired)
        );
        assert_eq!(
            svc.verify_at(&issued.token, issued.expires_at + Duration::hours(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_subsecond_issue_time_truncates_expiry() {
        let svc = service();
        let now = noon() + Duration::milliseconds(750);
        let issued = svc.issue_at(Uuid::new_v4(), None, Duration::seconds(10), now);
        assert_eq!(issued.expires_at, noon() + Duration::seconds(10));
    }

    #[test]
    fn test_tampered_signature_byte_is_bad_signature() {
        let svc = service();
        let issued = svc.issue_at(Uuid::new_v4(), None, Duration::minutes(10), noon());
        let (payload, signature) = issued.token.split_once('.').unwrap();
        let raw = TOKEN_ENGINE.decode(signature).unwrap();

        for index in 0..raw.len() {
            let mut tampered = raw.clone();
            tampered[index] ^= 0x01;
            let token = format!("{}.{}", payload, TOKEN_ENGINE.encode(&tampered));
            assert_eq!(
                svc.verify_at(&token, noon()),
                Err(TokenError::BadSignature),
                "byte {} flipped",
                index
            );
        }
    }

    #[test]
    fn test_tampered_payload_is_bad_signature() {
        let svc = service();
        let event_id = Uuid::new_v4();
        let issued = svc.issue_at(event_id, None, Duration::minutes(10), noon());
        let (_, signature) = issued.token.split_once('.').unwrap();

        let forged_payload = format!("{}|{}", event_id, noon().timestamp() + 86_400);
        let token = format!("{}.{}", TOKEN_ENGINE.encode(forged_payload), signature);
        assert_eq!(svc.verify_at(&token, noon()), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_other_secret_is_bad_signature() {
        let issued = service().issue_at(Uuid::new_v4(), None, Duration::minutes(10), noon());
        let other = AttendanceTokenService::new(b"ffffffffffffffffffffffffffffffff").unwrap();
        assert_eq!(
            other.verify_at(&issued.token, noon()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn test_truncated_signature_is_bad_signature() {
        let svc = service();
        let issued = svc.issue_at(Uuid::new_v4(), None, Duration::minutes(10), noon());
        let (payload, signature) = issued.token.split_once('.').unwrap();
        let raw = TOKEN_ENGINE.decode(signature).unwrap();
        let token = format!("{}.{}", payload, TOKEN_ENGINE.encode(&raw[..16]));
        assert_eq!(svc.verify_at(&token, noon()), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_malformed_tokens() {
        let svc = service();
        assert_eq!(svc.verify_at("", noon()), Err(TokenError::Malformed));
        assert_eq!(svc.verify_at("no-separator", noon()), Err(TokenError::Malformed));
        assert_eq!(svc.verify_at(".abc", noon()), Err(TokenError::Malformed));
        assert_eq!(svc.verify_at("abc.", noon()), Err(TokenError::Malformed));
        assert_eq!(svc.verify_at("!!!.abc", noon()), Err(TokenError::Malformed));
    }

    #[test]
    fn test_validly_signed_garbage_payload_is_malformed() {
        let svc = service();
        let payload = b"not-a-uuid|123";
        let token = format!(
            "{}.{}",
            TOKEN_ENGINE.encode(payload),
            TOKEN_ENGINE.encode(svc.sign(payload))
        );
        assert_eq!(svc.verify_at(&token, noon()), Err(TokenError::Malformed));

        let payload = b"a|b|c|d";
        let token = format!(
            "{}.{}",
            TOKEN_ENGINE.encode(payload),
            TOKEN_ENGINE.encode(svc.sign(payload))
        );
        assert_eq!(svc.verify_at(&token, noon()), Err(TokenError::Malformed));
    }

    #[test]
    fn test_padded_segments_are_accepted() {
        let svc = service();
        let issued = svc.issue_at(Uuid::new_v4(), None, Duration::minutes(10), noon());
        let (payload, signature) = issued.token.split_once('.').unwrap();

        let pad = |segment: &str| {
            let missing = (4 - segment.len() % 4) % 4;
            format!("{}{}", segment, "=".repeat(missing))
        };
        let padded = format!("{}.{}", pad(payload), pad(signature));
        assert!(svc.verify_at(&padded, noon()).is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let err = AttendanceTokenService::new(b"too-short").unwrap_err();
        assert!(err.to_string().contains("at least 32 bytes"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let debug = format!("{:?}", service());
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("0123456789abcdef"));
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(TokenError::Malformed.code(), "malformed");
        assert_eq!(TokenError::BadSignature.code(), "bad_signature");
        assert_eq!(TokenError::Expired.code(), "expired");
    }
}
