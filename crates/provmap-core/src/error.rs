//! Error types for provmap core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using provmap Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the provenance graph engine
#[derive(Error, Debug)]
pub enum Error {
    /// I/O errors (configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation not legal in the graph's current lifecycle state
    #[error("Invalid state: {0}")]
    State(String),

    /// Bad handle, duplicate insert, or wrong source group on a move
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Node or edge not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Structural invariant violated; the graph can no longer be trusted
    #[error("Corrupt structure: {0}")]
    Corrupt(String),

    /// Configuration could not be parsed or applied
    #[error("Configuration error: {0}")]
    Config(String),

    /// Long-running algorithm observed the cancellation flag
    #[error("Operation cancelled")]
    Cancelled,
}

/// Failure category reported alongside a message when a job fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Lifecycle misuse
    State,
    /// Caller passed something invalid
    Argument,
    /// Lookup miss
    NotFound,
    /// Consistency check failed
    Consistency,
    /// Configuration problem
    Config,
    /// I/O problem
    Io,
}

impl Error {
    /// Create a state error
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a corrupt structure error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::Corrupt(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True when the error is a cancellation rather than a failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Failure category, or `None` for cancellation
    pub fn category(&self) -> Option<ErrorCategory> {
        match self {
            Self::Io(_) => Some(ErrorCategory::Io),
            Self::State(_) => Some(ErrorCategory::State),
            Self::InvalidArgument(_) => Some(ErrorCategory::Argument),
            Self::NotFound(_) => Some(ErrorCategory::NotFound),
            Self::Corrupt(_) => Some(ErrorCategory::Consistency),
            Self::Config(_) => Some(ErrorCategory::Config),
            Self::Cancelled => None,
        }
    }
}
