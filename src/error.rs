//! Error types for zfs-ops
//!
//! Provides structured error types for command execution, output parsing,
//! snapshot streaming and configuration.

use std::time::Duration;
use thiserror::Error;

/// Unified error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Invocation Errors
    // =========================================================================
    /// The tool exited non-zero or could not be spawned
    #[error("command failed: {command}: {reason}: {stderr}")]
    Command {
        /// Program path and joined arguments
        command: String,
        /// Captured standard error
        stderr: String,
        /// Exit status or spawn failure
        reason: String,
    },

    // =========================================================================
    // Cancellation Errors
    // =========================================================================
    #[error("command cancelled: {command}")]
    Cancelled { command: String },

    #[error("command timed out after {after:?}: {command}")]
    Timeout { command: String, after: Duration },

    // =========================================================================
    // Parse Errors
    // =========================================================================
    #[error("output does not match what is expected on this platform: expected {expected} columns, found {found} in {line:?}")]
    ColumnMismatch {
        expected: usize,
        found: usize,
        line: String,
    },

    #[error("invalid number in column {column}: {value:?}")]
    InvalidNumber { column: &'static str, value: String },

    #[error("unexpected output: {0}")]
    UnexpectedOutput(String),

    // =========================================================================
    // Stream Errors
    // =========================================================================
    #[error("stream error on {command}: {source}")]
    Stream {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stream task failed: {0}")]
    Task(String),

    // =========================================================================
    // Configuration / IO Errors
    // =========================================================================
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad category of an error, for callers that branch on failure type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The tool rejected the operation (or could not be started)
    Invocation,
    /// The caller's cancellation or timeout fired first
    Cancellation,
    /// Tool output did not have the expected shape
    Parse,
    /// Piping data to or from a child failed
    Stream,
    /// Configuration, serialization and local IO
    Internal,
}

impl Error {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Command { .. } => ErrorKind::Invocation,

            Error::Cancelled { .. } | Error::Timeout { .. } => ErrorKind::Cancellation,

            Error::ColumnMismatch { .. }
            | Error::InvalidNumber { .. }
            | Error::UnexpectedOutput(_) => ErrorKind::Parse,

            Error::Stream { .. } | Error::Task(_) => ErrorKind::Stream,

            Error::Configuration(_) | Error::Yaml(_) | Error::Io(_) => ErrorKind::Internal,
        }
    }

    /// Check if the tool itself rejected the operation
    pub fn is_invocation(&self) -> bool {
        self.kind() == ErrorKind::Invocation
    }

    /// Check if this error came from cancellation or timeout
    pub fn is_cancellation(&self) -> bool {
        self.kind() == ErrorKind::Cancellation
    }

    /// Captured standard error of a failed invocation
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Error::Command { stderr, .. } => Some(stderr),
            _ => None,
        }
    }

    /// Command line the error refers to, if any
    pub fn command(&self) -> Option<&str> {
        match self {
            Error::Command { command, .. }
            | Error::Cancelled { command }
            | Error::Timeout { command, .. }
            | Error::Stream { command, .. } => Some(command),
            _ => None,
        }
    }
}

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;
