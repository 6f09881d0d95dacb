use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use docgate_core::ResourceId;

/// A grant of access to one resource (e.g. a purchased unlock).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Entitlement {
    pub resource_id: ResourceId,
}

/// Resources an identity may access. Fetched fresh per request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntitlementSet(BTreeSet<ResourceId>);

impl EntitlementSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceId> {
        self.0.iter()
    }
}

impl FromIterator<ResourceId> for EntitlementSet {
    fn from_iter<I: IntoIterator<Item = ResourceId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromIterator<Entitlement> for EntitlementSet {
    fn from_iter<I: IntoIterator<Item = Entitlement>>(iter: I) -> Self {
        iter.into_iter().map(|e| e.resource_id).collect()
    }
}
