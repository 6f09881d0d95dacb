//! `docgate-auth` — pure authorization boundary for document access.
//!
//! This crate is intentionally decoupled from HTTP and from the upstream
//! services that issue sessions and entitlements.

pub mod authorize;
pub mod entitlements;
pub mod identity;
pub mod roles;

pub use authorize::{
    AccessGrant, AccessPolicy, AuthzError, MatchKind, authorize, explain_authorization,
};
pub use entitlements::{Entitlement, EntitlementSet};
pub use identity::{Identity, IdentityId};
pub use roles::Role;
