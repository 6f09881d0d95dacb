//! Infrastructure layer: adapters for the services the gateway consumes.
//!
//! Nothing here owns state. Sessions, identities, entitlements and document
//! bytes all belong to other systems and are treated read-only.

pub mod directory;
pub mod error;
pub mod origin;
pub mod session;

pub use directory::{AccountDirectory, HttpAccountDirectory, InMemoryAccountDirectory, UserInfo};
pub use error::{UpstreamError, UpstreamService};
pub use origin::{DocumentOrigin, HttpDocumentOrigin, InMemoryDocumentOrigin, OriginBody, OriginResponse};
pub use session::{CookieSessionVerifier, Credential, Session, SessionState, SessionVerifier};
