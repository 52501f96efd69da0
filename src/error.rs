//! Error types

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single rule check
///
/// Recovered by the scanner: the check is recorded as incomplete and the
/// remaining checks still run.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("{0}")]
    Unexpected(String),
}

/// Scan-level failure, raised when no document can be scanned at all
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid window snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}
