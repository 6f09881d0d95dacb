//! Infrastructure wiring: real HTTP adapters for the configured upstreams.

use std::sync::Arc;

use docgate_infra::{CookieSessionVerifier, HttpAccountDirectory, HttpDocumentOrigin};

use crate::app::gateway::GatewayState;
use crate::config::{ConfigError, GatewayConfig};

/// Build gateway state backed by reqwest clients.
///
/// One client is shared by the account directory and the origin so both reuse
/// the same connection pool.
pub fn build_services(config: GatewayConfig) -> Result<GatewayState, ConfigError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("docgate/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

    let sessions = Arc::new(CookieSessionVerifier::new(config.session_cookie.clone()));
    let directory = Arc::new(HttpAccountDirectory::new(
        client.clone(),
        config.backend_url.clone(),
        config.upstream_timeout,
    ));
    let origin = Arc::new(HttpDocumentOrigin::new(client, config.upstream_timeout));

    Ok(GatewayState::new(config, sessions, directory, origin))
}
