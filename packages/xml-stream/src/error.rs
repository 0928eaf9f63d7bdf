//! Error types for the streaming transformer.
//!
//! Unknown elements and coercion failures are deliberately absent: the
//! former are ignored and the latter produce sentinel values.

use thiserror::Error;

/// Main error type for the streaming transformer.
#[derive(Debug, Error)]
pub enum StreamError {
    /// A context could not be built because a required field was missing.
    #[error("Configuration error for <{element}>: {reason}")]
    Configuration { element: String, reason: String },

    /// Malformed markup reported by the tokenizer.
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    /// Input ended while a root element was still open.
    #[error("Truncated document: <{element}> still open at end of input ({open} unclosed)")]
    TruncatedDocument { element: String, open: usize },

    /// The stream already failed or ended; no further input is accepted.
    #[error("Stream is halted after a previous error or end of input")]
    Halted,

    /// Schema file could not be interpreted.
    #[error("Failed to load schema: {0}")]
    SchemaLoad(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StreamError {
    /// Build a configuration error for an element.
    pub fn configuration(element: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            element: element.into(),
            reason: reason.into(),
        }
    }

    /// Build a syntax error at a byte position.
    pub fn syntax(position: u64, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }
}

/// Result type alias for transformer operations.
pub type Result<T> = std::result::Result<T, StreamError>;
