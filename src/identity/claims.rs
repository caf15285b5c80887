//! Local decoding of bearer-token claims.
//!
//! The payload segment is read without verifying the signature. The result
//! is only an optimistic identity hint; the authoritative refresh against the
//! identity endpoint corrects it.

#[cfg(test)]
#[path = "claims_test.rs"]
mod claims_test;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::Value;

use crate::error::AuthError;

/// Decode the JSON claims object carried in a JWT's payload segment.
///
/// # Errors
///
/// Returns [`AuthError::Decode`] if the token has no payload segment or the
/// segment is not base64url-encoded JSON object.
pub fn decode_claims(token: &str) -> Result<Value, AuthError> {
    let mut segments = token.trim().split('.');
    let payload = match (segments.next(), segments.next()) {
        (Some(_header), Some(payload)) if !payload.is_empty() => payload,
        _ => return Err(AuthError::Decode("token has no payload segment".to_owned())),
    };
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::Decode(e.to_string()))?;
    let claims: Value = serde_json::from_slice(&bytes).map_err(|e| AuthError::Decode(e.to_string()))?;
    if !claims.is_object() {
        return Err(AuthError::Decode("claims are not an object".to_owned()));
    }
    Ok(claims)
}
