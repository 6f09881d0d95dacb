//! Gateway failure taxonomy and the redirect-based error responder.
//!
//! No JSON error bodies: every failure becomes a redirect to the frontend's
//! error page carrying a human-readable message and the numeric status.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use thiserror::Error;
use url::Url;

use docgate_infra::UpstreamService;

/// Terminal failure of a document request.
///
/// Variants carry only what is needed to name the failing stage in logs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("missing key")]
    MissingKey,

    #[error("missing secret")]
    MissingSecret,

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("session expired")]
    SessionExpired,

    #[error("account verification failed")]
    IdentityUnresolved,

    #[error("permission denied")]
    PermissionDenied,

    #[error("document not found")]
    DocumentNotFound,

    #[error("origin responded with status {0}")]
    Origin(u16),

    #[error("{0} timed out")]
    UpstreamTimeout(UpstreamService),

    #[error("transfer failed: {0}")]
    Transfer(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingKey | Self::MissingSecret | Self::InvalidKey(_) => StatusCode::BAD_REQUEST,
            Self::SessionExpired | Self::IdentityUnresolved => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::DocumentNotFound => StatusCode::NOT_FOUND,
            Self::Origin(status) => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            Self::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Transfer(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the user. Never includes internal detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MissingKey => "Missing access key. Please open the full link you were given.",
            Self::MissingSecret => {
                "Document access is not configured on the server (missing secret)."
            }
            Self::InvalidKey(_) => "Invalid or corrupted access key.",
            Self::SessionExpired => "Your session has expired. Please sign in again.",
            Self::IdentityUnresolved => "Account verification failed. Please sign in again.",
            Self::PermissionDenied => {
                "Permission denied. Your account has not unlocked this document."
            }
            Self::DocumentNotFound => "The requested document could not be found.",
            Self::Origin(_) => "Unable to retrieve the document. Please try again later.",
            Self::UpstreamTimeout(_) => {
                "The document service took too long to respond. Please try again."
            }
            Self::Transfer(_) => "An error occurred while loading the document.",
        }
    }

    /// Whether retrying the same request may succeed without user action.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UpstreamTimeout(_) => true,
            Self::Origin(status) => *status >= 500,
            _ => false,
        }
    }
}

/// Builds terminal redirects against the frontend.
#[derive(Debug, Clone)]
pub struct ErrorResponder {
    frontend: Url,
}

impl ErrorResponder {
    pub fn new(frontend: Url) -> Self {
        Self { frontend }
    }

    /// `{frontend}/error?message=..&status=..`
    pub fn error_location(&self, err: &GatewayError) -> String {
        let mut url = self.page("error");
        url.query_pairs_mut()
            .append_pair("message", err.user_message())
            .append_pair("status", err.status().as_str());
        url.to_string()
    }

    /// `{frontend}/login?returnTo=<original path and query>`
    pub fn sign_in_location(&self, return_to: &str) -> String {
        let mut url = self.page("login");
        url.query_pairs_mut().append_pair("returnTo", return_to);
        url.to_string()
    }

    pub fn respond(&self, err: &GatewayError) -> Response {
        let mut resp = Redirect::to(&self.error_location(err)).into_response();
        resp.headers_mut()
            .insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-store"));
        resp
    }

    pub fn sign_in(&self, return_to: &str) -> Response {
        let mut resp = Redirect::to(&self.sign_in_location(return_to)).into_response();
        resp.headers_mut()
            .insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-store"));
        resp
    }

    fn page(&self, name: &str) -> Url {
        let mut base = self.frontend.clone();
        base.set_query(None);
        base.set_fragment(None);
        if !base.path().ends_with('/') {
            let p = format!("{}/", base.path());
            base.set_path(&p);
        }
        match base.join(name) {
            Ok(url) => url,
            Err(_) => base,
        }
    }
}
