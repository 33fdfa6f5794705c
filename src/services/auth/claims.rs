//! Unverified claim extraction from the bearer credential.
//!
//! Nothing here checks a signature. The result is only used to correlate a
//! request with its audit row; whether the caller is allowed to run the query
//! is decided by the vault authorization call.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("token is missing from the authorization header")]
    MissingToken,
    #[error("token is malformed")]
    Malformed,
    #[error("token header is invalid: {0}")]
    Header(#[from] jsonwebtoken::errors::Error),
    #[error("token payload is not valid base64url: {0}")]
    PayloadEncoding(#[from] base64::DecodeError),
    #[error("token payload is not a JSON object: {0}")]
    PayloadJson(#[from] serde_json::Error),
    #[error("token has no string 'jti' claim")]
    MissingJti,
}

/// Claims read from a credential whose signature has NOT been checked.
/// Only good for correlation; never converted into an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnverifiedClaims {
    pub jti: String,
}

/// Decode the second whitespace-separated token of an `Authorization` value.
pub fn decode_unverified(authorization: &str) -> Result<UnverifiedClaims, ClaimError> {
    let token = authorization
        .split_whitespace()
        .nth(1)
        .ok_or(ClaimError::MissingToken)?;

    decode_credential(token)
}

fn decode_credential(token: &str) -> Result<UnverifiedClaims, ClaimError> {
    let mut segments = token.split('.');
    let (Some(_), Some(payload), Some(_), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(ClaimError::Malformed);
    };

    // header: alg/typ が JWT として読めることだけ確認する (署名は見ない)
    jsonwebtoken::decode_header(token)?;

    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
    let claims: Map<String, Value> = serde_json::from_slice(&bytes)?;

    match claims.get("jti") {
        Some(Value::String(jti)) => Ok(UnverifiedClaims { jti: jti.clone() }),
        _ => Err(ClaimError::MissingJti),
    }
}
