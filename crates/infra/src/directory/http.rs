use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use docgate_auth::{Entitlement, IdentityId};
use docgate_core::ResourceId;

use super::{AccountDirectory, UserInfo};
use crate::error::bounded;
use crate::{Credential, UpstreamError, UpstreamService};

/// reqwest-backed client for the account backend.
#[derive(Debug, Clone)]
pub struct HttpAccountDirectory {
    client: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UnlockedResourcesRequest<'a> {
    user_id: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UnlockedResourceDto {
    #[serde(default)]
    resource_id: serde_json::Value,
}

/// Backends answer either a bare list or `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum UnlockedResourcesResponse {
    List(Vec<UnlockedResourceDto>),
    Wrapped { data: Vec<UnlockedResourceDto> },
}

impl HttpAccountDirectory {
    pub fn new(client: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            client,
            base_url,
            timeout,
        }
    }

    fn endpoint(&self, service: UpstreamService, path: &str) -> Result<Url, UpstreamError> {
        // Keep any path prefix on the base URL (e.g. `/api/`).
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let p = format!("{}/", base.path());
            base.set_path(&p);
        }
        base.join(path).map_err(|e| UpstreamError::Payload {
            service,
            message: format!("invalid backend url: {e}"),
        })
    }
}

fn resource_id_from(value: serde_json::Value) -> Option<ResourceId> {
    match value {
        serde_json::Value::String(s) => ResourceId::new(s).ok(),
        serde_json::Value::Number(n) => ResourceId::new(n.to_string()).ok(),
        _ => None,
    }
}

#[async_trait]
impl AccountDirectory for HttpAccountDirectory {
    async fn user_info(&self, credential: &Credential) -> Result<UserInfo, UpstreamError> {
        let service = UpstreamService::Identity;
        let url = self.endpoint(service, "user-info")?;

        bounded(service, self.timeout, async {
            let resp = self
                .client
                .get(url)
                .bearer_auth(credential.as_str())
                .send()
                .await
                .map_err(|e| UpstreamError::transport(service, e))?;

            if !resp.status().is_success() {
                return Err(UpstreamError::Status {
                    service,
                    status: resp.status().as_u16(),
                });
            }

            resp.json::<UserInfo>()
                .await
                .map_err(|e| UpstreamError::Payload {
                    service,
                    message: e.to_string(),
                })
        })
        .await
    }

    async fn unlocked_resources(
        &self,
        credential: &Credential,
        user_id: &IdentityId,
    ) -> Result<Vec<Entitlement>, UpstreamError> {
        let service = UpstreamService::Entitlements;
        let url = self.endpoint(service, "user-unlocked-resources")?;

        bounded(service, self.timeout, async {
            let resp = self
                .client
                .post(url)
                .bearer_auth(credential.as_str())
                .json(&UnlockedResourcesRequest {
                    user_id: user_id.as_str(),
                })
                .send()
                .await
                .map_err(|e| UpstreamError::transport(service, e))?;

            if !resp.status().is_success() {
                return Err(UpstreamError::Status {
                    service,
                    status: resp.status().as_u16(),
                });
            }

            let body = resp
                .json::<UnlockedResourcesResponse>()
                .await
                .map_err(|e| UpstreamError::Payload {
                    service,
                    message: e.to_string(),
                })?;

            let items = match body {
                UnlockedResourcesResponse::List(items) => items,
                UnlockedResourcesResponse::Wrapped { data } => data,
            };

            let entitlements: Vec<Entitlement> = items
                .into_iter()
                .filter_map(|dto| resource_id_from(dto.resource_id))
                .map(|resource_id| Entitlement { resource_id })
                .collect();
            tracing::debug!(count = entitlements.len(), "unlocked resources fetched");
            Ok(entitlements)
        })
        .await
    }
}
