use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::Role;

/// Identity of the caller as known to the account backend.
///
/// Backends report ids as either strings or integers; both normalise to text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct IdentityId(String);

impl IdentityId {
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for IdentityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
        }

        let text = match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s,
            Raw::Int(n) => n.to_string(),
        };
        IdentityId::new(text).ok_or_else(|| serde::de::Error::custom("empty identity id"))
    }
}

/// A resolved caller: id plus roles. Fetched fresh per request, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: IdentityId,
    pub roles: BTreeSet<Role>,
}

impl Identity {
    pub fn new(id: IdentityId, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            id,
            roles: roles.into_iter().collect(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(Role::is_admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_id_accepts_string_or_number() {
        let a: IdentityId = serde_json::from_str("\"u-42\"").unwrap();
        let b: IdentityId = serde_json::from_str("42").unwrap();
        assert_eq!(a.as_str(), "u-42");
        assert_eq!(b.as_str(), "42");
        assert!(serde_json::from_str::<IdentityId>("\"\"").is_err());
    }

    #[test]
    fn admin_detection() {
        let id = IdentityId::new("1").unwrap();
        assert!(Identity::new(id.clone(), [Role::new("user"), Role::admin()]).is_admin());
        assert!(!Identity::new(id, [Role::new("administrator")]).is_admin());
    }
}
