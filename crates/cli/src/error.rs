//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Event file not found
    #[error("Event file not found: {path}")]
    EventNotFound { path: String },

    /// Event could not be read or parsed
    #[error("Failed to read event: {message}")]
    EventInput { message: String },

    /// Settings or credential problem
    #[error("Configuration error: {0}")]
    Config(#[from] contracts::ContractError),

    /// The run could not start or complete
    #[error("Dispatch failed: {0}")]
    Dispatch(#[from] dispatcher::DispatcherError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn event_not_found(path: impl Into<String>) -> Self {
        Self::EventNotFound { path: path.into() }
    }

    pub fn event_input(message: impl Into<String>) -> Self {
        Self::EventInput {
            message: message.into(),
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
