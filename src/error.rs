//! Error types for quipchat

use thiserror::Error;

/// Result type alias for quipchat operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the relay or the chat client
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A required request field is missing or invalid
    #[error("validation error: {0}")]
    Validation(String),

    /// The hosted model API failed or returned something unusable
    #[error("upstream error: {0}")]
    Upstream(String),

    /// The relay rejected or failed a text chat request
    #[error("relay error: {0}")]
    Relay(String),

    /// Sending an audio clip to the relay failed
    #[error("upload error: {0}")]
    Upload(String),

    /// Microphone access was refused
    #[error("microphone permission denied: {0}")]
    PermissionDenied(String),

    /// Audio capture or encoding error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech synthesis error
    #[error("speech error: {0}")]
    Speech(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
