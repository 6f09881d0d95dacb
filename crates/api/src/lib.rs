//! HTTP gateway for private documents: decode, authenticate, authorize, stream.

pub mod app;
pub mod config;
