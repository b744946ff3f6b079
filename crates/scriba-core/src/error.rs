//! Error types for the Scriba transcription gateway

use thiserror::Error;

/// Result type alias for transcription operations
pub type ScribaResult<T> = Result<T, ScribaError>;

/// Errors that can occur while serving a transcription request
#[derive(Error, Debug)]
pub enum ScribaError {
    /// Missing or invalid configuration. Fatal at startup: the gateway must
    /// not serve requests without the operator password and the API key.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Please upload an audio file before transcribing")]
    EmptyUpload,

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// Terminal error reported by the external service. The message is the
    /// service's error string verbatim; no retry, no local classification.
    #[error("{0}")]
    Service(String),

    #[error("Transcription request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ScribaError {
    fn from(err: reqwest::Error) -> Self {
        ScribaError::Http(err.to_string())
    }
}
