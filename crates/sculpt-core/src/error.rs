//! Error types for sculpt

use thiserror::Error;

/// The main error type for sculpt operations
#[derive(Debug, Error)]
pub enum SculptError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown model '{value}'. Options: {options:?}")]
    UnknownModel {
        value: String,
        options: Vec<&'static str>,
    },

    #[error("No image in provider response: {0}")]
    NoImageInResponse(String),

    #[error("No artifact found in provider output: {0}")]
    NoArtifactFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    Forbidden(String),

    #[error("Image error: {0}")]
    Image(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for sculpt operations
pub type Result<T> = std::result::Result<T, SculptError>;
