use std::sync::Arc;

use axum::{
    extract::{Extension, OriginalUri, Path, RawQuery},
    http::HeaderMap,
    response::Response,
};

use crate::app::errors::GatewayError;
use crate::app::gateway::{self, DocumentRequest, GatewayOutcome, GatewayState, StageFailure};

/// Query parameter carrying the access token.
pub const KEY_PARAM: &str = "key";

/// `GET /documents/:name?key=<token>`
pub async fn get_document(
    Extension(state): Extension<Arc<GatewayState>>,
    Path(name): Path<String>,
    RawQuery(query): RawQuery,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Response {
    let key = query.as_deref().and_then(key_param);
    let return_to = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let req = DocumentRequest {
        name,
        key,
        return_to,
        headers,
    };

    match gateway::run(&state, req).await {
        Ok(GatewayOutcome::Stream(resp)) => resp,
        Ok(GatewayOutcome::SignIn { return_to }) => state.responder.sign_in(&return_to),
        Err(StageFailure { stage, error }) => {
            log_failure(stage, &error);
            state.responder.respond(&error)
        }
    }
}

fn key_param(query: &str) -> Option<String> {
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == KEY_PARAM)
        .map(|(_, v)| v.into_owned())
}

fn log_failure(stage: gateway::GatewayStage, error: &GatewayError) {
    let status = error.status().as_u16();
    match error {
        GatewayError::Transfer(_) | GatewayError::Origin(_) => {
            tracing::error!(%stage, status, %error, "document request failed");
        }
        _ => tracing::warn!(%stage, status, %error, retryable = error.is_retryable(), "document request failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_param_is_percent_decoded() {
        assert_eq!(key_param("key=a%2Bb&x=1").as_deref(), Some("a+b"));
        assert_eq!(key_param("x=1"), None);
        assert_eq!(key_param("key=").as_deref(), Some(""));
    }
}
