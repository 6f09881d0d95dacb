//! Decoded document location.

use url::Url;

use crate::error::{DomainError, DomainResult};

/// Plaintext origin URL recovered from an [`AccessToken`](crate::AccessToken).
///
/// Request-scoped. It embeds the resource identifier (e.g. a company id) that
/// authorization is matched against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUrl {
    raw: String,
    url: Url,
}

impl DocumentUrl {
    /// Parse decoded plaintext. Only absolute `http`/`https` URLs are accepted.
    pub fn parse(plaintext: impl Into<String>) -> DomainResult<Self> {
        let raw = plaintext.into();
        let url = Url::parse(raw.trim()).map_err(|e| DomainError::invalid_url(e.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(DomainError::invalid_url(format!("unsupported scheme '{other}'")));
            }
        }

        if url.host_str().is_none() {
            return Err(DomainError::invalid_url("missing host"));
        }

        Ok(Self { raw, url })
    }

    /// The plaintext exactly as decoded.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// Non-empty path segments, percent-decoding left untouched.
    pub fn path_segments(&self) -> Vec<&str> {
        self.url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    /// Whether `needle` occurs anywhere in the decoded plaintext.
    pub fn contains(&self, needle: &str) -> bool {
        !needle.is_empty() && self.raw.contains(needle)
    }

    /// Host and path only; safe to log (no query string, no credentials).
    pub fn redacted(&self) -> String {
        format!(
            "{}://{}{}",
            self.url.scheme(),
            self.url.host_str().unwrap_or_default(),
            self.url.path()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_https_url() {
        let doc = DocumentUrl::parse("https://origin/docs/CMP123/cert.pdf").unwrap();
        assert_eq!(doc.path_segments(), vec!["docs", "CMP123", "cert.pdf"]);
        assert!(doc.contains("CMP123"));
        assert!(!doc.contains(""));
    }

    #[test]
    fn rejects_non_http_schemes_and_garbage() {
        assert!(DocumentUrl::parse("file:///etc/passwd").is_err());
        assert!(DocumentUrl::parse("not a url").is_err());
    }

    #[test]
    fn redacted_drops_query_and_userinfo() {
        let doc = DocumentUrl::parse("https://user:pw@origin/docs/a.pdf?sig=secret").unwrap();
        assert_eq!(doc.redacted(), "https://origin/docs/a.pdf");
    }
}
