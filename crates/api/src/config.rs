//! Gateway configuration, loaded once at startup from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use docgate_core::SecretKey;

/// Caching policy applied to streamed documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Shared-cache freshness, in seconds.
    pub max_age_secs: u64,
    /// Window during which a stale copy may be served while revalidating.
    pub stale_while_revalidate_secs: u64,
}

impl CachePolicy {
    /// Build a policy; a revalidation window not longer than `max_age` is
    /// raised to twice `max_age`.
    pub fn new(max_age_secs: u64, stale_while_revalidate_secs: u64) -> Self {
        let swr = if stale_while_revalidate_secs > max_age_secs {
            stale_while_revalidate_secs
        } else {
            max_age_secs.saturating_mul(2).max(1)
        };
        Self {
            max_age_secs,
            stale_while_revalidate_secs: swr,
        }
    }

    pub fn header_value(&self) -> String {
        format!(
            "public, max-age={0}, s-maxage={0}, stale-while-revalidate={1}",
            self.max_age_secs, self.stale_while_revalidate_secs
        )
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(3600, 86_400)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}: invalid socket address '{value}'")]
    InvalidAddr { key: &'static str, value: String },

    #[error("{key}: invalid url: {message}")]
    InvalidUrl { key: &'static str, message: String },

    #[error("{key}: expected a non-negative integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("http client: {0}")]
    HttpClient(String),
}

/// Gateway configuration.
///
/// The secret key is optional so the process can start without it; every
/// document request then fails with "missing secret".
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub secret_key: Option<SecretKey>,

    /// Identity/entitlement backend.
    pub backend_url: Url,

    /// User-facing frontend; sign-in and error pages live here.
    pub frontend_url: Url,

    /// Cookie carrying the session bearer.
    pub session_cookie: String,

    /// Bound applied to each upstream call.
    pub upstream_timeout: Duration,

    pub cache: CachePolicy,
}

pub const ENV_BIND_ADDR: &str = "DOCGATE_BIND_ADDR";
pub const ENV_SECRET_KEY: &str = "DOCGATE_SECRET_KEY";
pub const ENV_BACKEND_URL: &str = "DOCGATE_BACKEND_URL";
pub const ENV_FRONTEND_URL: &str = "DOCGATE_FRONTEND_URL";
pub const ENV_SESSION_COOKIE: &str = "DOCGATE_SESSION_COOKIE";
pub const ENV_UPSTREAM_TIMEOUT_SECS: &str = "DOCGATE_UPSTREAM_TIMEOUT_SECS";
pub const ENV_CACHE_MAX_AGE_SECS: &str = "DOCGATE_CACHE_MAX_AGE_SECS";
pub const ENV_STALE_WHILE_REVALIDATE_SECS: &str = "DOCGATE_STALE_WHILE_REVALIDATE_SECS";

impl GatewayConfig {
    /// Load settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind = get(ENV_BIND_ADDR, "0.0.0.0:8080");
        let bind_addr = bind.parse().map_err(|_| ConfigError::InvalidAddr {
            key: ENV_BIND_ADDR,
            value: bind.clone(),
        })?;

        let secret_key = lookup(ENV_SECRET_KEY).and_then(SecretKey::new);

        let backend_url = parse_url(ENV_BACKEND_URL, &get(ENV_BACKEND_URL, "http://localhost:4000"))?;
        let frontend_url =
            parse_url(ENV_FRONTEND_URL, &get(ENV_FRONTEND_URL, "http://localhost:3000"))?;

        let timeout = parse_u64(ENV_UPSTREAM_TIMEOUT_SECS, &get(ENV_UPSTREAM_TIMEOUT_SECS, "30"))?;
        let max_age = parse_u64(ENV_CACHE_MAX_AGE_SECS, &get(ENV_CACHE_MAX_AGE_SECS, "3600"))?;
        let swr = parse_u64(
            ENV_STALE_WHILE_REVALIDATE_SECS,
            &get(ENV_STALE_WHILE_REVALIDATE_SECS, "86400"),
        )?;

        Ok(Self {
            bind_addr,
            secret_key,
            backend_url,
            frontend_url,
            session_cookie: get(ENV_SESSION_COOKIE, "session_token"),
            upstream_timeout: Duration::from_secs(timeout.max(1)),
            cache: CachePolicy::new(max_age, swr),
        })
    }
}

fn parse_url(key: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        key,
        message: e.to_string(),
    })
}

fn parse_u64(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = GatewayConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert!(cfg.secret_key.is_none());
        assert_eq!(cfg.session_cookie, "session_token");
        assert_eq!(cfg.upstream_timeout, Duration::from_secs(30));
        assert_eq!(cfg.cache, CachePolicy::new(3600, 86_400));
    }

    #[test]
    fn secret_is_loaded_but_empty_secret_is_unset() {
        let cfg = GatewayConfig::from_lookup(lookup(&[(ENV_SECRET_KEY, "k3y")])).unwrap();
        assert!(cfg.secret_key.is_some());

        let cfg = GatewayConfig::from_lookup(lookup(&[(ENV_SECRET_KEY, "")])).unwrap();
        assert!(cfg.secret_key.is_none());
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = GatewayConfig::from_lookup(lookup(&[(ENV_UPSTREAM_TIMEOUT_SECS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));

        let err = GatewayConfig::from_lookup(lookup(&[(ENV_FRONTEND_URL, "::nope")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn revalidate_window_always_exceeds_max_age() {
        let p = CachePolicy::new(600, 300);
        assert_eq!(p.stale_while_revalidate_secs, 1200);
        assert_eq!(
            p.header_value(),
            "public, max-age=600, s-maxage=600, stale-while-revalidate=1200"
        );
    }

    #[test]
    fn debug_output_redacts_secret() {
        let cfg = GatewayConfig::from_lookup(lookup(&[(ENV_SECRET_KEY, "topsecret")])).unwrap();
        assert!(!format!("{cfg:?}").contains("topsecret"));
    }
}
