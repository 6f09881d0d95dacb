//! Symmetric obfuscation codec for document access tokens.
//!
//! Tokens are `base64url(plaintext XOR repeat(key))` without padding. This is
//! obfuscation only: a fixed repeating XOR key is recoverable from enough
//! ciphertext, so a token must never be the sole access control. Session and
//! entitlement checks always run after decoding.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;

use crate::SecretKey;

/// Codec failure.
///
/// All variants surface to callers as the same "invalid or corrupted access key"
/// message; the variant only matters for logs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("empty token")]
    EmptyToken,

    #[error("malformed base64: {0}")]
    Base64(String),

    #[error("plaintext is not valid utf-8")]
    Utf8,
}

impl CodecError {
    /// Caller-visible description, identical for every variant.
    pub fn public_message(&self) -> &'static str {
        "invalid or corrupted access key."
    }
}

/// Recover the plaintext URL from a URL-safe token.
pub fn decode(token: &str, key: &SecretKey) -> Result<String, CodecError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(CodecError::EmptyToken);
    }

    let standard = to_standard_alphabet(token);
    let bytes = STANDARD
        .decode(standard.as_bytes())
        .map_err(|e| CodecError::Base64(e.to_string()))?;

    let plain = xor_with_key(&bytes, key.as_bytes());
    String::from_utf8(plain).map_err(|_| CodecError::Utf8)
}

/// Obfuscate a plaintext URL into a URL-safe token (inverse of [`decode`]).
pub fn encode(plaintext: &str, key: &SecretKey) -> String {
    let cipher = xor_with_key(plaintext.as_bytes(), key.as_bytes());
    STANDARD
        .encode(cipher)
        .chars()
        .filter_map(|c| match c {
            '+' => Some('-'),
            '/' => Some('_'),
            '=' => None,
            other => Some(other),
        })
        .collect()
}

/// Map `-`/`_` back to `+`/`/`, accept `.` as an explicit pad, then pad to a
/// multiple of four.
fn to_standard_alphabet(token: &str) -> String {
    let mut out: String = token
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            '.' => '=',
            other => other,
        })
        .collect();

    while out.len() % 4 != 0 {
        out.push('=');
    }
    out
}

/// XOR `data` with `key` repeated (or truncated) to `data.len()`.
fn xor_with_key(data: &[u8], key: &[u8]) -> Vec<u8> {
    data.iter()
        .zip(key.iter().cycle())
        .map(|(d, k)| d ^ k)
        .collect()
}
