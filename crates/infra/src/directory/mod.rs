//! Account directory boundary: identity lookup and unlocked resources.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use docgate_auth::{Entitlement, IdentityId, Role};

use crate::{Credential, UpstreamError};

pub mod http;
pub mod in_memory;

pub use http::HttpAccountDirectory;
pub use in_memory::InMemoryAccountDirectory;

/// Caller identity as reported by `user-info`.
///
/// `id` is optional on the wire; an absent id means the account could not be
/// verified. Missing or `null` roles mean no roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub id: Option<IdentityId>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub roles: Vec<Role>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identity + entitlement backend, queried fresh on every request.
#[async_trait]
pub trait AccountDirectory: Send + Sync + 'static {
    /// `GET user-info` with the bearer credential.
    async fn user_info(&self, credential: &Credential) -> Result<UserInfo, UpstreamError>;

    /// `POST user-unlocked-resources` with `{ userId }` and the bearer credential.
    ///
    /// Callers must treat any error other than a timeout as "no entitlements".
    async fn unlocked_resources(
        &self,
        credential: &Credential,
        user_id: &IdentityId,
    ) -> Result<Vec<Entitlement>, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_or_missing_roles_mean_no_roles() {
        let null: UserInfo = serde_json::from_str(r#"{"id":7,"roles":null}"#).unwrap();
        let missing: UserInfo = serde_json::from_str(r#"{"id":7}"#).unwrap();

        assert!(null.id.is_some());
        assert!(null.roles.is_empty());
        assert!(missing.roles.is_empty());
    }

    #[test]
    fn roles_are_read_when_present() {
        let info: UserInfo = serde_json::from_str(r#"{"id":"root","roles":["admin"]}"#).unwrap();
        assert!(info.roles.iter().any(Role::is_admin));
    }
}
