use thiserror::Error;

use crate::capture::CaptureFailure;

/// Represents errors surfaced by the export orchestrator to its caller.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The caller asked for an export without selecting any cycle.
    #[error("No cycles selected for export")]
    EmptySelection,

    /// Every capture strategy failed; carries one consolidated user-facing message.
    #[error("{message}")]
    TotalFailure {
        message: String,
        attempts: Vec<CaptureFailure>,
    },

    /// Invalid configuration value (usually from the environment).
    #[error("Configuration error: {0}")]
    Config(String),

    /// An I/O error occurred while delivering the produced document.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error originating from the underlying HTTP client (`reqwest`).
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),
}

/// A type alias for `Result<T, ExportError>` for convenience within the crate.
pub type Result<T> = std::result::Result<T, ExportError>;
