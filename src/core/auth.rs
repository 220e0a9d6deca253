//! Bearer-token verification against the shared signing secret.
//!
//! Tokens are HS256-signed JWTs issued by an external service with a known
//! claim schema (`sub`, `role`, `iat`, `exp`). Verification is a pure
//! function of the token and the configured secret: no side effects beyond
//! logging, no I/O, no suspension. Every failure mode maps to the same
//! externally-visible 401 with a generic message; the distinct variant only
//! ever reaches the internal logs.

use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::Deserialize;
use thiserror::Error;

/// Token verification failures. All surface as 401; callers never learn
/// which variant occurred.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// Authorization header missing, wrong scheme, or empty token.
    #[error("authorization header missing or malformed")]
    MalformedCredential,

    /// Signature does not verify against the configured secret.
    #[error("token signature verification failed")]
    InvalidSignature,

    /// The token's expiry is not in the future.
    #[error("token has expired")]
    Expired,

    /// A required claim is absent or unusable.
    #[error("token claims violate the expected schema: {0}")]
    SchemaViolation(String),
}

impl VerificationError {
    /// Stable label for metrics and structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            VerificationError::MalformedCredential => "malformed_credential",
            VerificationError::InvalidSignature => "invalid_signature",
            VerificationError::Expired => "expired",
            VerificationError::SchemaViolation(_) => "schema_violation",
        }
    }
}

/// Verified identity claims. Produced fresh per request, owned exclusively
/// by that request's processing context, and discarded when it completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    pub subject: String,
    pub role: String,
    pub issued_at: Option<u64>,
    pub expires_at: u64,
}

/// Raw JWT payload as decoded, before schema checks. Optional fields let us
/// report a precise schema violation instead of an opaque decode error.
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<String>,
    role: Option<String>,
    iat: Option<u64>,
    exp: Option<u64>,
}

/// Validates bearer credentials against a single configured secret.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::default();
        // `exp` must be strictly in the future; the default 60s leeway would
        // accept recently-expired tokens.
        validation.leeway = 0;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a raw bearer token and extract identity claims.
    pub fn verify(&self, raw_token: &str) -> Result<IdentityClaims, VerificationError> {
        if raw_token.is_empty() {
            return Err(VerificationError::MalformedCredential);
        }

        let token_data = decode::<RawClaims>(raw_token, &self.decoding_key, &self.validation)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => {
                    VerificationError::Expired
                }
                ErrorKind::MissingRequiredClaim(claim) => {
                    VerificationError::SchemaViolation(format!("missing claim '{claim}'"))
                }
                ErrorKind::Json(e) => VerificationError::SchemaViolation(e.to_string()),
                ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Utf8(_) => {
                    VerificationError::MalformedCredential
                }
                _ => VerificationError::InvalidSignature,
            })?;

        let claims = token_data.claims;
        let subject = claims
            .sub
            .filter(|s| !s.is_empty())
            .ok_or_else(|| VerificationError::SchemaViolation("missing claim 'sub'".into()))?;
        let role = claims
            .role
            .filter(|r| !r.is_empty())
            .ok_or_else(|| VerificationError::SchemaViolation("missing claim 'role'".into()))?;
        let expires_at = claims
            .exp
            .ok_or_else(|| VerificationError::SchemaViolation("missing claim 'exp'".into()))?;

        // These values become trusted downstream headers; anything that is
        // not a legal header value cannot be propagated safely.
        if !is_header_safe(&subject) {
            return Err(VerificationError::SchemaViolation(
                "'sub' is not a valid header value".into(),
            ));
        }
        if !is_header_safe(&role) {
            return Err(VerificationError::SchemaViolation(
                "'role' is not a valid header value".into(),
            ));
        }

        Ok(IdentityClaims {
            subject,
            role,
            issued_at: claims.iat,
            expires_at,
        })
    }
}

/// Extract the bearer token from an `Authorization` header value.
///
/// The scheme match is case-sensitive: exactly `Bearer ` followed by the
/// credential and nothing else. An empty token or one padded with
/// whitespace (e.g. a doubled space after the scheme) is malformed.
pub fn extract_bearer(header_value: &str) -> Result<&str, VerificationError> {
    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or(VerificationError::MalformedCredential)?;

    if token.is_empty() || token.trim() != token {
        return Err(VerificationError::MalformedCredential);
    }

    Ok(token)
}

fn is_header_safe(value: &str) -> bool {
    value.bytes().all(|b| (0x20..0x7f).contains(&b))
}
