//! crates/chaekgoeul_core/src/token.rs
//!
//! Client-side inspection of bearer tokens. The signature is never verified
//! here; the claims segment is only decoded to read the expiry so the client
//! can drop a dead token without a server round trip.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Base64url with optional padding; issuers disagree on whether to pad.
const CLAIMS_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The subset of claims the client cares about.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Claims {
    /// Expiry as a NumericDate: seconds since the Unix epoch, possibly fractional.
    pub exp: f64,
}

impl Claims {
    /// Expiry truncated to whole milliseconds. Saturates at the `i64` bounds.
    pub fn expires_at_millis(&self) -> i64 {
        (self.exp * 1000.0).floor() as i64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenDecodeError {
    #[error("expected 3 dot-separated segments, found {0}")]
    Segments(usize),
    #[error("claims segment is not valid base64url: {0}")]
    Base64(String),
    #[error("claims segment is not a JSON object with a numeric exp: {0}")]
    Claims(String),
}

/// Decodes the middle segment of a `header.claims.signature` token.
pub fn decode_claims(token: &str) -> Result<Claims, TokenDecodeError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenDecodeError::Segments(segments.len()));
    }

    let raw = CLAIMS_ENGINE
        .decode(segments[1])
        .map_err(|e| TokenDecodeError::Base64(e.to_string()))?;

    serde_json::from_slice(&raw).map_err(|e| TokenDecodeError::Claims(e.to_string()))
}

/// Result of inspecting the locally stored token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    Valid,
    Expired,
    Missing,
    Invalid,
}

impl TokenStatus {
    pub fn is_authenticated(self) -> bool {
        matches!(self, TokenStatus::Valid)
    }

    /// Whether the stored credentials must be scrubbed.
    pub fn requires_purge(self) -> bool {
        matches!(self, TokenStatus::Expired | TokenStatus::Invalid)
    }
}

/// Classifies a stored token against `now`. A token whose expiry equals
/// `now` (millisecond precision) counts as expired.
pub fn evaluate(token: Option<&str>, now: DateTime<Utc>) -> TokenStatus {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return TokenStatus::Missing;
    };

    match decode_claims(token) {
        Ok(claims) if claims.expires_at_millis() <= now.timestamp_millis() => TokenStatus::Expired,
        Ok(_) => TokenStatus::Valid,
        Err(_) => TokenStatus::Invalid,
    }
}
