//! Configuration
//!
//! Describes how the two external tools are invoked and how streaming
//! transfers are buffered. Loadable from YAML, overridable from the CLI.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// =============================================================================
// Constants
// =============================================================================

/// Default capacity of the in-memory pipe joining send and receive
pub const DEFAULT_PIPE_CAPACITY: usize = 64 * 1024;

// =============================================================================
// Tool Command
// =============================================================================

/// How to launch one external tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCommand {
    /// Program to execute
    pub program: PathBuf,
    /// Arguments placed before every subcommand (e.g. a `sudo -n zfs` wrapper)
    #[serde(default)]
    pub prefix_args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            prefix_args: Vec::new(),
        }
    }

    /// Run the tool through a wrapper program, e.g. `sudo -n zfs`
    pub fn wrapped(wrapper: impl Into<PathBuf>, args: impl IntoIterator<Item = String>) -> Self {
        Self {
            program: wrapper.into(),
            prefix_args: args.into_iter().collect(),
        }
    }
}

// =============================================================================
// ZFS Configuration
// =============================================================================

/// Configuration for the command layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZfsConfig {
    /// Dataset tool
    pub zfs: ToolCommand,
    /// Pool tool
    pub zpool: ToolCommand,
    /// Per-invocation timeout in seconds; `None` waits for natural exit
    pub command_timeout_secs: Option<u64>,
    /// Capacity of the send/receive pipe in bytes
    pub pipe_capacity: usize,
}

impl Default for ZfsConfig {
    fn default() -> Self {
        Self {
            zfs: ToolCommand::new("zfs"),
            zpool: ToolCommand::new("zpool"),
            command_timeout_secs: None,
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
        }
    }
}

impl ZfsConfig {
    /// Parse configuration from YAML text
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&text)
    }

    /// Per-invocation timeout
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    /// Reject configurations that can never run a command
    pub fn validate(&self) -> Result<()> {
        for (label, tool) in [("zfs", &self.zfs), ("zpool", &self.zpool)] {
            if tool.program.as_os_str().is_empty() {
                return Err(Error::Configuration(format!(
                    "{} program path is empty",
                    label
                )));
            }
        }

        if self.pipe_capacity == 0 {
            return Err(Error::Configuration(
                "pipe_capacity must be greater than zero".into(),
            ));
        }

        if self.command_timeout_secs == Some(0) {
            return Err(Error::Configuration(
                "command_timeout_secs must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}
