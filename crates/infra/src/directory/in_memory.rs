use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use docgate_auth::{Entitlement, IdentityId};

use super::{AccountDirectory, UserInfo};
use crate::{Credential, UpstreamError, UpstreamService};

#[derive(Debug, Clone)]
struct Account {
    info: UserInfo,
    entitlements: Vec<Entitlement>,
}

/// In-memory account directory keyed by bearer credential.
///
/// Intended for tests/dev. Unknown credentials answer `401`.
#[derive(Debug, Default)]
pub struct InMemoryAccountDirectory {
    accounts: RwLock<HashMap<String, Account>>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the account behind `credential`.
    pub fn insert(&self, credential: &str, info: UserInfo, entitlements: Vec<Entitlement>) {
        let mut accounts = self
            .accounts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        accounts.insert(credential.to_string(), Account { info, entitlements });
    }

    fn account(&self, credential: &Credential) -> Option<Account> {
        let accounts = self
            .accounts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        accounts.get(credential.as_str()).cloned()
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn user_info(&self, credential: &Credential) -> Result<UserInfo, UpstreamError> {
        self.account(credential)
            .map(|a| a.info)
            .ok_or(UpstreamError::Status {
                service: UpstreamService::Identity,
                status: 401,
            })
    }

    async fn unlocked_resources(
        &self,
        credential: &Credential,
        user_id: &IdentityId,
    ) -> Result<Vec<Entitlement>, UpstreamError> {
        match self.account(credential) {
            Some(a) if a.info.id.as_ref() == Some(user_id) => Ok(a.entitlements),
            _ => Err(UpstreamError::Status {
                service: UpstreamService::Entitlements,
                status: 403,
            }),
        }
    }
}
