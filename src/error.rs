//! Error types for docs-readtime

use thiserror::Error;

/// Errors raised at the fallible edges of the engine (configuration and
/// session mounting). Estimation and timing never fail; they degrade to a
/// zero estimate instead.
#[derive(Debug, Error)]
pub enum ReadingError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("A reading session is already mounted for document: {0}")]
    SessionAlreadyMounted(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
