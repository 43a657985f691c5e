//! Error types for the TabCalc application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire TabCalc application.
///
/// Expression problems (`ParseError`, `EvalError` in [`crate::engine`]) are not
/// part of this enum: they never leave the evaluator and are reported as failed
/// history entries instead.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CalcError {
    /// Index outside the session list (UI contract violation)
    #[error("Invalid session index {index} (session count: {len})")]
    InvalidIndex { index: usize, len: usize },

    /// Writing the session store failed; in-memory state is unaffected
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A persisted section could not be decoded and was replaced by its default
    #[error("Corrupt data in '{section}': {message}")]
    CorruptData { section: String, message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON"
        message: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CalcError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an InvalidIndex error
    pub fn invalid_index(index: usize, len: usize) -> Self {
        Self::InvalidIndex { index, len }
    }

    /// Creates a Persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Creates a CorruptData error
    pub fn corrupt(section: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptData {
            section: section.into(),
            message: message.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an InvalidIndex error
    pub fn is_invalid_index(&self) -> bool {
        matches!(self, Self::InvalidIndex { .. })
    }

    /// Check if this is a persistence error
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }

    /// Errors of this kind are logged and never block interaction.
    pub fn is_operational(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::CorruptData { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for CalcError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for CalcError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for CalcError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for CalcError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, CalcError>`.
pub type Result<T> = std::result::Result<T, CalcError>;
