//! Document origin boundary: where the actual bytes live.
//!
//! The origin is trusted for content only. Its headers are reported back so
//! the gateway can derive its own, never forwarded verbatim.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use docgate_core::DocumentUrl;

use crate::UpstreamError;

pub mod http;
pub mod in_memory;

pub use http::HttpDocumentOrigin;
pub use in_memory::InMemoryDocumentOrigin;

/// Body of an origin response, yielded chunk by chunk as it arrives.
pub type OriginBody = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static>>;

/// Successful (2xx) origin response with its body still unread.
pub struct OriginResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub body: OriginBody,
}

impl core::fmt::Debug for OriginResponse {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OriginResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait DocumentOrigin: Send + Sync + 'static {
    /// Plain `GET` against the decoded URL.
    ///
    /// Non-2xx answers are reported as [`UpstreamError::Status`]. Only the
    /// response head is awaited; the body is returned as a stream.
    async fn fetch(&self, url: &DocumentUrl) -> Result<OriginResponse, UpstreamError>;
}
