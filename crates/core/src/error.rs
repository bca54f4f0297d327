//! Error types for Ragdesk.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! remote model calls, index persistence and request validation.

use thiserror::Error;

/// Unified error type for Ragdesk.
///
/// All fallible functions return `Result<T, AppError>`. The variants follow the
/// failure classes a request can end in, so the HTTP and CLI layers can decide
/// how to report them without inspecting messages.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller input rejected before any work was done
    #[error("{0}")]
    Validation(String),

    /// A query arrived before anything was ingested
    #[error("No documents indexed yet")]
    EmptyIndex,

    /// Embedding API errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Completion (LLM) API errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Vector index persistence errors
    #[error("Index error: {0}")]
    Index(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether the failure was caused by the caller rather than by the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::EmptyIndex)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
