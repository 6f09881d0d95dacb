//! Document transfer proxy: relays the origin body as a stream with
//! gateway-derived headers.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::Response;
use futures::TryStreamExt;

use docgate_core::AccessToken;
use docgate_infra::{OriginResponse, UpstreamError, UpstreamService};

use crate::app::errors::GatewayError;
use crate::config::CachePolicy;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";
pub const CONTENT_SECURITY_POLICY: &str = "default-src 'self'; frame-ancestors 'self'";

/// Map an origin failure onto the gateway taxonomy.
pub fn origin_failure(err: UpstreamError) -> GatewayError {
    match err {
        UpstreamError::Status { status: 404, .. } => GatewayError::DocumentNotFound,
        UpstreamError::Status { status, .. } => GatewayError::Origin(status),
        UpstreamError::Timeout { .. } => GatewayError::UpstreamTimeout(UpstreamService::Origin),
        other => GatewayError::Transfer(other.to_string()),
    }
}

/// Headers for a streamed document. The origin's declared type is ignored.
pub fn document_headers(
    file_name: &str,
    content_length: Option<u64>,
    token: &AccessToken,
    cache: &CachePolicy,
) -> Result<HeaderMap, GatewayError> {
    let mut headers = HeaderMap::new();

    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(PDF_CONTENT_TYPE));
    headers.insert(
        header::CONTENT_DISPOSITION,
        value(&format!("inline; filename=\"{}\"", attachment_name(file_name)))?,
    );
    headers.insert(header::CACHE_CONTROL, value(&cache.header_value())?);

    if let Some(len) = content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
        headers.insert(
            header::ETAG,
            value(&format!("\"{len}-{}\"", token.fingerprint()))?,
        );
    }

    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("SAMEORIGIN"));
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(CONTENT_SECURITY_POLICY),
    );

    Ok(headers)
}

/// Turn an origin response into the client response without buffering the body.
pub fn relay(
    origin: OriginResponse,
    file_name: &str,
    token: &AccessToken,
    cache: &CachePolicy,
) -> Result<Response, GatewayError> {
    if let Some(declared) = origin.content_type.as_deref()
        && !declared.starts_with(PDF_CONTENT_TYPE)
    {
        tracing::debug!(declared, "origin content-type differs; serving as pdf");
    }

    let headers = document_headers(file_name, origin.content_length, token, cache)?;

    let body = origin.body.inspect_err(|e| {
        tracing::error!(error = %e, "origin stream failed mid-transfer");
    });

    let mut resp = Response::new(Body::from_stream(body));
    *resp.status_mut() = StatusCode::OK;
    resp.headers_mut().extend(headers);
    Ok(resp)
}

/// Filename offered to the browser, derived from the logical document name.
fn attachment_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('.');

    let base = if cleaned.is_empty() { "document" } else { cleaned };
    if base.to_ascii_lowercase().ends_with(".pdf") {
        base.to_string()
    } else {
        format!("{base}.pdf")
    }
}

fn value(s: &str) -> Result<HeaderValue, GatewayError> {
    HeaderValue::from_str(s).map_err(|e| GatewayError::Transfer(format!("invalid header: {e}")))
}
