//! Tracing/logging setup shared by the gateway binaries and tests.

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::DEFAULT_FILTER);
}

/// Like [`init`], but with plain-text output for local runs and tests.
pub fn init_pretty() {
    tracing::init_pretty(tracing::DEFAULT_FILTER);
}

/// Tracing configuration (filters, layers).
pub mod tracing;
