//! Error types for beacon-core operations.
//!
//! Everything here is non-fatal at the tracker boundary: storage errors degrade
//! to in-memory operation and report errors are logged and dropped. The types
//! exist so callers that *do* care (the CLI, tests) can inspect what went wrong.

use std::path::PathBuf;

/// All errors that can occur in beacon-core operations.
///
/// Report delivery has its own error type ([`crate::report::ReportError`])
/// because its failure mode is part of the delivery contract, not an
/// operational fault.
#[derive(Debug, thiserror::Error)]
pub enum BeaconError {
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("State file write failed: {path}: {source}")]
    StateWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using BeaconError.
pub type Result<T> = std::result::Result<T, BeaconError>;
