//! Error handling and error types for the collective primitives.
//!
//! The reduction itself treats every failure as fatal, but the conditions
//! that lead there are modelled as a regular `Result` so that configuration
//! loading, transports and the fallible reduction entry point can propagate
//! them with `?`.

use crate::core::network::CollStatus;
use std::io;
use thiserror::Error;

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum CollectiveError {
    /// The transport reported a non-success status for a collective call
    #[error("{message} (status: {status:?})")]
    Transport { status: CollStatus, message: String },

    /// The caller supplied fewer elements than the declared count
    #[error("Reduction buffer too short: count {count}, length {length}")]
    BufferTooShort { count: usize, length: usize },

    /// Gather output does not match ranks times count
    #[error("Staging size mismatch: expected {expected}, got {actual}")]
    StagingSizeMismatch { expected: usize, actual: usize },

    /// Configuration and validation errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

/// Type alias for Results using CollectiveError
pub type Result<T> = std::result::Result<T, CollectiveError>;

impl CollectiveError {
    /// Create a transport error for a failed collective call
    pub fn transport<S: Into<String>>(status: CollStatus, message: S) -> Self {
        CollectiveError::Transport {
            status,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        CollectiveError::Config {
            message: message.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P: Into<String>, V: Into<String>, R: Into<String>>(
        parameter: P,
        value: V,
        reason: R,
    ) -> Self {
        CollectiveError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error came out of the transport layer
    pub fn is_transport(&self) -> bool {
        matches!(self, CollectiveError::Transport { .. })
    }
}
