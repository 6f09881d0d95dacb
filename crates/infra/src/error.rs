use thiserror::Error;

/// Which collaborator a failure came from (for logs and status mapping).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamService {
    Session,
    Identity,
    Entitlements,
    Origin,
}

impl core::fmt::Display for UpstreamService {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Session => "session",
            Self::Identity => "identity",
            Self::Entitlements => "entitlements",
            Self::Origin => "origin",
        })
    }
}

/// Failure talking to an upstream service.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// The call did not complete within the configured bound. Retryable.
    #[error("{service} timed out")]
    Timeout { service: UpstreamService },

    /// Connection, TLS or body read failure.
    #[error("{service} transport error: {message}")]
    Transport {
        service: UpstreamService,
        message: String,
    },

    /// The service answered with a non-success status.
    #[error("{service} responded with status {status}")]
    Status { service: UpstreamService, status: u16 },

    /// The service answered 2xx but the payload could not be understood.
    #[error("{service} returned an unreadable payload: {message}")]
    Payload {
        service: UpstreamService,
        message: String,
    },
}

impl UpstreamError {
    pub fn service(&self) -> UpstreamService {
        match self {
            Self::Timeout { service }
            | Self::Transport { service, .. }
            | Self::Status { service, .. }
            | Self::Payload { service, .. } => *service,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub(crate) fn transport(service: UpstreamService, err: reqwest::Error) -> Self {
        // reqwest errors may embed the request URL; keep only the kind.
        let message = if err.is_connect() {
            "connection failed".to_string()
        } else if err.is_body() || err.is_decode() {
            "body error".to_string()
        } else {
            "request failed".to_string()
        };
        Self::Transport { service, message }
    }
}

/// Bound an upstream future by `limit`, mapping elapsed time to [`UpstreamError::Timeout`].
pub(crate) async fn bounded<T, F>(
    service: UpstreamService,
    limit: std::time::Duration,
    fut: F,
) -> Result<T, UpstreamError>
where
    F: core::future::Future<Output = Result<T, UpstreamError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res,
        Err(_elapsed) => Err(UpstreamError::Timeout { service }),
    }
}
