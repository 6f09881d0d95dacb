//! Session verification boundary.
//!
//! The gateway does not issue sessions; it only asks whether the inbound
//! request carries one and, if so, which bearer credential it holds.

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::UpstreamError;

pub mod cookie;

pub use cookie::CookieSessionVerifier;

/// Opaque bearer value proving a session to downstream services.
///
/// `Debug` is redacted; the value is only ever placed in an `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Debug for Credential {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// A recognised session. The credential may be absent when the session has lapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub credential: Option<Credential>,
}

/// Outcome of session verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No session at all: the caller must sign in.
    Missing,
    Active(Session),
}

/// Validates the ambient request context (headers/cookies).
#[async_trait]
pub trait SessionVerifier: Send + Sync + 'static {
    async fn verify(&self, headers: &HeaderMap) -> Result<SessionState, UpstreamError>;
}
