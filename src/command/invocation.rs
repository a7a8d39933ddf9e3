//! Invocation types
//!
//! What to run, what to feed it, and where its output goes.

use crate::command::table;
use std::fmt;
use tokio::io::{AsyncRead, AsyncWrite};

// =============================================================================
// Tool
// =============================================================================

/// The two external programs this crate drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Dataset tool (`zfs`)
    Zfs,
    /// Pool tool (`zpool`)
    Zpool,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tool::Zfs => write!(f, "zfs"),
            Tool::Zpool => write!(f, "zpool"),
        }
    }
}

// =============================================================================
// Standard Streams
// =============================================================================

/// Source for the child's standard input
pub enum Input {
    /// Child reads from the null device
    Null,
    /// Fixed bytes, e.g. a passphrase
    Bytes(Vec<u8>),
    /// Arbitrary stream, e.g. the read end of a send/receive pipe
    Reader(Box<dyn AsyncRead + Send + Unpin>),
}

impl fmt::Debug for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Null => write!(f, "Null"),
            // never print secrets fed on stdin
            Input::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            Input::Reader(_) => write!(f, "Reader"),
        }
    }
}

/// Destination for the child's standard output
pub enum Output {
    /// Capture in memory and return as [`CommandOutput`]
    Capture,
    /// Forward everything to a caller-owned sink; captured output is empty
    Sink(Box<dyn AsyncWrite + Send + Unpin>),
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Capture => write!(f, "Capture"),
            Output::Sink(_) => write!(f, "Sink"),
        }
    }
}

// =============================================================================
// Invocation
// =============================================================================

/// One run of an external tool
#[derive(Debug)]
pub struct Invocation {
    pub tool: Tool,
    pub args: Vec<String>,
    pub stdin: Input,
    pub stdout: Output,
}

impl Invocation {
    /// Invocation with no input whose output is captured
    pub fn new(tool: Tool, args: Vec<String>) -> Self {
        Self {
            tool,
            args,
            stdin: Input::Null,
            stdout: Output::Capture,
        }
    }

    pub fn zfs(args: Vec<String>) -> Self {
        Self::new(Tool::Zfs, args)
    }

    pub fn zpool(args: Vec<String>) -> Self {
        Self::new(Tool::Zpool, args)
    }

    pub fn with_stdin_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.stdin = Input::Bytes(bytes.into());
        self
    }

    pub fn with_stdin(mut self, reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        self.stdin = Input::Reader(Box::new(reader));
        self
    }

    pub fn with_stdout(mut self, writer: impl AsyncWrite + Send + Unpin + 'static) -> Self {
        self.stdout = Output::Sink(Box::new(writer));
        self
    }
}

// =============================================================================
// Command Output
// =============================================================================

/// Captured standard output of a successful invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    stdout: String,
}

impl CommandOutput {
    pub fn new(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
        }
    }

    /// Output that went to a caller-supplied sink
    pub fn empty() -> Self {
        Self::default()
    }

    /// Raw text
    pub fn as_str(&self) -> &str {
        &self.stdout
    }

    /// Lines split into whitespace-separated fields
    pub fn table(&self) -> Vec<Vec<String>> {
        table::split_table(&self.stdout)
    }

    /// Lines split on the tool's tab delimiter, keeping empty fields
    pub fn records(&self) -> Vec<Vec<String>> {
        table::split_records(&self.stdout)
    }
}
