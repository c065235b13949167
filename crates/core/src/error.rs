//! Error types for the Copra service.
//!
//! This module defines a unified error enum that covers all error categories
//! in the application, including configuration, I/O, LLM, retrieval, history,
//! and ingestion errors.

use thiserror::Error;

/// Unified error type for the Copra service.
///
/// All functions in the application return `Result<T, AppError>`.
/// We never panic — errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// LLM provider errors (chat completion, embeddings)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Vector index errors
    #[error("Index error: {0}")]
    Index(String),

    /// Retrieval pipeline errors
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Document ingestion errors
    #[error("Ingestion error: {0}")]
    Ingest(String),

    /// No history file exists for the given user
    #[error("No history found for user '{0}'")]
    HistoryNotFound(String),

    /// A history index was out of range
    #[error("Invalid history index {index} for user '{user_id}'")]
    InvalidHistoryIndex { user_id: String, index: usize },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
