//! Structured error types for session-view
//!
//! Using thiserror for automatic Display implementation and error chaining.
//!
//! Data anomalies in event content (missing identities, parents that never
//! arrive, duplicate deliveries) are not errors: the tree degrades to empty or
//! false derived values instead. Only caller contract violations and I/O at
//! the edges surface here.

use super::types::ProcessId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Root process {0} is not in the process map")]
    UnknownRoot(ProcessId),
}

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read session data file {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid session data: {0}")]
    InvalidSessionData(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
