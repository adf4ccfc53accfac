// Error types for the uploader.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the uploader error type.
pub type Result<T> = std::result::Result<T, UploaderError>;

#[derive(Error, Debug)]
pub enum UploaderError {
    /// Network or connection failure while talking to the asset API
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The API answered 2xx but the body could not be interpreted
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Create-asset succeeded but carried no operation path
    #[error("no operation path returned")]
    MissingOperationPath,

    /// Operation finished without an asset id
    #[error("operation done but no asset id")]
    MissingResult,

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UploaderError {
    /// Whether another poll attempt could change the outcome.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            UploaderError::Transport(_) | UploaderError::Http { .. } | UploaderError::MalformedResponse(_)
        )
    }
}
