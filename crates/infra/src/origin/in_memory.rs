use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

use docgate_core::DocumentUrl;

use super::{DocumentOrigin, OriginResponse};
use crate::{UpstreamError, UpstreamService};

#[derive(Debug, Clone)]
enum Entry {
    Document { content_type: String, chunks: Vec<Bytes> },
    Status(u16),
}

/// In-memory origin keyed by full URL.
///
/// Intended for tests/dev. Unknown URLs answer `404`.
#[derive(Debug, Default)]
pub struct InMemoryDocumentOrigin {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryDocumentOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `chunks` (in order) for `url`.
    pub fn insert_document(&self, url: &str, content_type: &str, chunks: Vec<Bytes>) {
        self.write().insert(
            url.to_string(),
            Entry::Document {
                content_type: content_type.to_string(),
                chunks,
            },
        );
    }

    /// Answer `status` for `url`.
    pub fn insert_status(&self, url: &str, status: u16) {
        self.write().insert(url.to_string(), Entry::Status(status));
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Entry>> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DocumentOrigin for InMemoryDocumentOrigin {
    async fn fetch(&self, url: &DocumentUrl) -> Result<OriginResponse, UpstreamError> {
        let entry = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(url.as_str())
            .cloned();

        match entry {
            Some(Entry::Document {
                content_type,
                chunks,
            }) => {
                let len = chunks.iter().map(|c| c.len() as u64).sum();
                Ok(OriginResponse {
                    status: 200,
                    content_length: Some(len),
                    content_type: Some(content_type),
                    body: futures::stream::iter(chunks.into_iter().map(Ok)).boxed(),
                })
            }
            Some(Entry::Status(status)) => Err(UpstreamError::Status {
                service: UpstreamService::Origin,
                status,
            }),
            None => Err(UpstreamError::Status {
                service: UpstreamService::Origin,
                status: 404,
            }),
        }
    }
}
