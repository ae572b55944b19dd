// ============================
// spendtrack-backend-lib/src/auth/token.rs
// ============================
//! Stateless signed bearer tokens.
//!
//! A token is `base64url(claims JSON) "." base64url(HMAC-SHA256 tag)`,
//! signed with the process-wide secret. Nothing is persisted: signature and
//! expiry verify without a store lookup.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::config::SigningSecret;

type HmacSha256 = Hmac<Sha256>;

/// Claims carried by a token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Subject: the username the token was issued to
    pub sub: String,
    /// Absolute expiry, unix seconds
    pub exp: u64,
}

/// Why a token was rejected. Internal to the auth module; callers outside it
/// only ever see a single unauthorized outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token malformed")]
    Malformed,
    #[error("token signature invalid")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn sign(payload: &[u8], secret: &SigningSecret) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Issue a token for `subject`, expiring `ttl` from now.
pub fn issue(subject: &str, secret: &SigningSecret, ttl: Duration) -> String {
    let claims = Claims {
        sub: subject.to_string(),
        exp: unix_now() + ttl.as_secs(),
    };
    let json = serde_json::to_vec(&claims).expect("claims always serialize");
    let payload = URL_SAFE_NO_PAD.encode(json);
    // The tag covers the encoded payload, so any bit flip invalidates it
    let tag = URL_SAFE_NO_PAD.encode(sign(payload.as_bytes(), secret));
    format!("{payload}.{tag}")
}

/// Decode and verify a token.
///
/// Signature is checked first (constant-time tag comparison), then expiry,
/// strictly: a token whose expiry equals the current second is already dead.
pub fn decode(token: &str, secret: &SigningSecret) -> Result<Claims, TokenError> {
    let (payload, tag_b64) = token.split_once('.').ok_or(TokenError::Malformed)?;
    let tag = URL_SAFE_NO_PAD
        .decode(tag_b64)
        .map_err(|_| TokenError::Malformed)?;

    let expected = sign(payload.as_bytes(), secret);
    if tag.len() != expected.len() || !bool::from(tag.ct_eq(&expected)) {
        return Err(TokenError::InvalidSignature);
    }

    let json = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    let claims: Claims = serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;
    if claims.sub.is_empty() {
        return Err(TokenError::Malformed);
    }
    if unix_now() >= claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(claims)
}
