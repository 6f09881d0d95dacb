use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::CONTENT_TYPE;

use docgate_core::DocumentUrl;

use super::{DocumentOrigin, OriginResponse};
use crate::error::bounded;
use crate::{UpstreamError, UpstreamService};

/// reqwest-backed origin. The timeout bounds the response head only, so large
/// documents are never cut off mid-stream.
#[derive(Debug, Clone)]
pub struct HttpDocumentOrigin {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpDocumentOrigin {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl DocumentOrigin for HttpDocumentOrigin {
    async fn fetch(&self, url: &DocumentUrl) -> Result<OriginResponse, UpstreamError> {
        let service = UpstreamService::Origin;

        let resp = bounded(service, self.timeout, async {
            self.client
                .get(url.as_url().clone())
                .send()
                .await
                .map_err(|e| UpstreamError::transport(service, e))
        })
        .await?;

        let status = resp.status();
        tracing::debug!(status = status.as_u16(), "origin responded");
        if !status.is_success() {
            return Err(UpstreamError::Status {
                service,
                status: status.as_u16(),
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Ok(OriginResponse {
            status: status.as_u16(),
            content_length: resp.content_length(),
            content_type,
            body: resp.bytes_stream().map_err(std::io::Error::other).boxed(),
        })
    }
}
