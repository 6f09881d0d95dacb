//! `docgate-core` — document gateway building blocks.
//!
//! This crate contains **pure** primitives (no IO, no HTTP): the access token
//! codec, the process secret, and the decoded document location.

pub mod codec;
pub mod document;
pub mod error;
pub mod id;
pub mod secret;

pub use codec::{CodecError, decode, encode};
pub use document::DocumentUrl;
pub use error::{DomainError, DomainResult};
pub use id::{AccessToken, ResourceId};
pub use secret::SecretKey;
