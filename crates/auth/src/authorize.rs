use serde::Serialize;
use thiserror::Error;

use docgate_core::{DocumentUrl, ResourceId};

use crate::{EntitlementSet, Identity, IdentityId};

/// Effective access policy for one identity.
///
/// Admins get [`AccessPolicy::AdminAll`]; everyone else is scoped to the
/// resources they hold entitlements for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPolicy {
    AdminAll,
    ScopedTo(EntitlementSet),
}

impl AccessPolicy {
    pub fn for_identity(identity: &Identity, entitlements: EntitlementSet) -> Self {
        if identity.is_admin() {
            Self::AdminAll
        } else {
            Self::ScopedTo(entitlements)
        }
    }
}

/// How an entitlement identifier was located inside the decoded URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// The identifier is a whole path segment.
    PathSegment,
    /// The identifier only occurs as a substring (file name, query, partial segment).
    Substring,
}

/// Affirmative authorization result. Nothing streams without one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessGrant {
    Admin,
    Entitled {
        resource_id: ResourceId,
        matched_by: MatchKind,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("permission denied: identity '{0}' holds no entitlement for this document")]
    Denied(IdentityId),
}

/// Decide whether `identity` may read `document`.
///
/// - No IO
/// - No panics
/// - Deterministic: same inputs, same answer
///
/// Non-admins are allowed iff at least one entitlement identifier occurs in the
/// decoded URL. Whole path-segment matches are preferred so the grant records
/// the strongest evidence; substring-only matches still allow access.
pub fn authorize(
    identity: &Identity,
    entitlements: &EntitlementSet,
    document: &DocumentUrl,
) -> Result<AccessGrant, AuthzError> {
    match AccessPolicy::for_identity(identity, entitlements.clone()) {
        AccessPolicy::AdminAll => Ok(AccessGrant::Admin),
        AccessPolicy::ScopedTo(scope) => match find_match(&scope, document) {
            Some((resource_id, matched_by)) => Ok(AccessGrant::Entitled {
                resource_id: resource_id.clone(),
                matched_by,
            }),
            None => Err(AuthzError::Denied(identity.id.clone())),
        },
    }
}

fn find_match<'a>(
    entitlements: &'a EntitlementSet,
    document: &DocumentUrl,
) -> Option<(&'a ResourceId, MatchKind)> {
    let segments = document.path_segments();

    if let Some(id) = entitlements
        .iter()
        .find(|id| segments.iter().any(|s| *s == id.as_str()))
    {
        return Some((id, MatchKind::PathSegment));
    }

    entitlements
        .iter()
        .find(|id| document.contains(id.as_str()))
        .map(|id| (id, MatchKind::Substring))
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Explanation of a document access decision, for logs and audits.
///
/// Never sent to the client.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub granted: bool,

    /// Human-readable reason for the decision.
    pub reason: String,

    pub identity: IdentityState,

    /// Number of entitlements considered (identifiers are not listed).
    pub entitlement_count: usize,

    pub matched_resource: Option<String>,
    pub match_kind: Option<MatchKind>,

    /// If denied, this explains what was missing.
    pub denial_reason: Option<DenialReason>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IdentityState {
    pub id: String,
    pub roles: Vec<String>,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    NoEntitlements,
    NoMatchingEntitlement,
}

/// Explain the decision [`authorize`] would make for the same inputs.
pub fn explain_authorization(
    identity: &Identity,
    entitlements: &EntitlementSet,
    document: &DocumentUrl,
) -> AuthorizationExplanation {
    let state = IdentityState {
        id: identity.id.to_string(),
        roles: identity.roles.iter().map(|r| r.as_str().to_string()).collect(),
        is_admin: identity.is_admin(),
    };

    let base = AuthorizationExplanation {
        granted: false,
        reason: String::new(),
        identity: state,
        entitlement_count: entitlements.len(),
        matched_resource: None,
        match_kind: None,
        denial_reason: None,
    };

    match authorize(identity, entitlements, document) {
        Ok(AccessGrant::Admin) => AuthorizationExplanation {
            granted: true,
            reason: "identity holds the 'admin' role (unconditional access)".to_string(),
            ..base
        },
        Ok(AccessGrant::Entitled {
            resource_id,
            matched_by,
        }) => AuthorizationExplanation {
            granted: true,
            reason: match matched_by {
                MatchKind::PathSegment => {
                    format!("entitlement '{resource_id}' matches a path segment of the document")
                }
                MatchKind::Substring => format!(
                    "entitlement '{resource_id}' occurs in the document location (substring match only)"
                ),
            },
            matched_resource: Some(resource_id.to_string()),
            match_kind: Some(matched_by),
            ..base
        },
        Err(_) if entitlements.is_empty() => AuthorizationExplanation {
            reason: "identity has no entitlements".to_string(),
            denial_reason: Some(DenialReason {
                kind: DenialKind::NoEntitlements,
                message: "No unlocked resources for this identity".to_string(),
                suggestions: vec![
                    "Purchase or request access to the resource owning this document".to_string(),
                ],
            }),
            ..base
        },
        Err(_) => AuthorizationExplanation {
            reason: format!(
                "none of {} entitlement(s) match the document location",
                entitlements.len()
            ),
            denial_reason: Some(DenialReason {
                kind: DenialKind::NoMatchingEntitlement,
                message: "The document belongs to a resource this identity has not unlocked"
                    .to_string(),
                suggestions: vec![
                    "Unlock the resource that owns this document".to_string(),
                    "Verify the link was issued for the current account".to_string(),
                ],
            }),
            ..base
        },
    }
}
