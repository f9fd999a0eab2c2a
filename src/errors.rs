//! Typed error hierarchy for Aether.
//!
//! Three top-level enums cover the three subsystems:
//! - `StoreError`: remote task/artifact store calls
//! - `ArtifactError`: AI card preconditions and transitions
//! - `ExportError`: PDF export failures

use thiserror::Error;

/// Errors from the remote task store and AI artifact store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    /// Map an HTTP status + error body to the matching variant.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            404 => StoreError::NotFound(message),
            409 => StoreError::Conflict(message),
            _ => StoreError::Http { status, message },
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            StoreError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            StoreError::from_status(status.as_u16(), err.to_string())
        } else {
            StoreError::Network(err.to_string())
        }
    }
}

/// Errors from AI card operations.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("A {kind} needs a selected commit")]
    MissingCommit { kind: &'static str },

    #[error("A {kind} needs a task")]
    MissingTask { kind: &'static str },

    #[error("Cannot {action} while the card is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("Unknown artifact kind '{0}'")]
    UnknownKind(String),

    #[error("Invalid analysis depth '{0}'. Valid values: quick, standard, deep")]
    UnknownDepth(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from PDF export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Artifact has no content to export")]
    EmptyArtifact,

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}
