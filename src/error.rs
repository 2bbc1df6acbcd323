//! Error types for agentcmd
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using AgentError
pub type Result<T> = std::result::Result<T, AgentError>;

/// Unified error type for agentcmd operations
#[derive(Debug, Error)]
pub enum AgentError {
    // -------------------------------------------------------------------------
    // Encoding Errors (nothing was sent)
    // -------------------------------------------------------------------------
    #[error("No available delimiter: every candidate appears in a parameter value")]
    NoAvailableDelimiter,

    #[error("Command line too long: {length} bytes (max {max})")]
    CommandTooLong { length: usize, max: usize },

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Connect failed: {0}")]
    ConnectFailed(#[source] std::io::Error),

    #[error("Write failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    #[error("Read failed: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("Connection closed before a complete header line was read")]
    ConnectionClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    /// True when the error was raised while building the command line,
    /// i.e. before any connection was opened or any byte written.
    pub fn is_encoding_error(&self) -> bool {
        matches!(
            self,
            AgentError::NoAvailableDelimiter
                | AgentError::CommandTooLong { .. }
                | AgentError::InvalidCommand(_)
        )
    }
}
