use axum::{Router, routing::get};

pub mod documents;
pub mod system;

/// Router for document endpoints.
pub fn router() -> Router {
    Router::new().route("/documents/:name", get(documents::get_document))
}
