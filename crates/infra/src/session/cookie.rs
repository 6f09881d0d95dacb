use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, COOKIE, HeaderMap};

use super::{Credential, Session, SessionState, SessionVerifier};
use crate::UpstreamError;

/// Session verifier reading the bearer from a session cookie or an
/// `Authorization: Bearer` header.
///
/// - Bearer header present → active session with that credential.
/// - Session cookie present → active session; an empty value means the session
///   exists but its credential has lapsed.
/// - Neither → no session.
#[derive(Debug, Clone)]
pub struct CookieSessionVerifier {
    cookie_name: String,
}

impl CookieSessionVerifier {
    pub fn new(cookie_name: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
        }
    }

    fn session_cookie<'a>(&self, headers: &'a HeaderMap) -> Option<&'a str> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|line| line.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.cookie_name)
            .map(|(_, value)| value.trim().trim_matches('"'))
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

#[async_trait]
impl SessionVerifier for CookieSessionVerifier {
    async fn verify(&self, headers: &HeaderMap) -> Result<SessionState, UpstreamError> {
        if let Some(token) = extract_bearer(headers) {
            return Ok(SessionState::Active(Session {
                credential: Credential::new(token),
            }));
        }

        match self.session_cookie(headers) {
            Some(value) => Ok(SessionState::Active(Session {
                credential: Credential::new(value),
            })),
            None => Ok(SessionState::Missing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn verifier() -> CookieSessionVerifier {
        CookieSessionVerifier::new("session_token")
    }

    #[tokio::test]
    async fn no_headers_means_missing_session() {
        let state = verifier().verify(&HeaderMap::new()).await.unwrap();
        assert_eq!(state, SessionState::Missing);
    }

    #[tokio::test]
    async fn session_cookie_yields_credential() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; session_token=abc123; other=1"),
        );

        let SessionState::Active(session) = verifier().verify(&headers).await.unwrap() else {
            panic!("expected active session");
        };
        assert_eq!(session.credential.unwrap().as_str(), "abc123");
    }

    #[tokio::test]
    async fn empty_cookie_is_active_session_without_credential() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session_token="));

        let state = verifier().verify(&headers).await.unwrap();
        assert_eq!(state, SessionState::Active(Session { credential: None }));
    }

    #[tokio::test]
    async fn bearer_header_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        headers.insert(COOKIE, HeaderValue::from_static("session_token=other"));

        let SessionState::Active(session) = verifier().verify(&headers).await.unwrap() else {
            panic!("expected active session");
        };
        assert_eq!(session.credential.unwrap().as_str(), "tok");
    }

    #[test]
    fn credential_debug_is_redacted() {
        let c = Credential::new("super-secret").unwrap();
        assert!(!format!("{c:?}").contains("super-secret"));
    }
}
