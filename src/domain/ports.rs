//! Domain Ports - Core trait definitions for the command layer
//!
//! These traits define the boundaries between the dataset model and the
//! outside world: something that runs tool invocations, and something that
//! records them. Adapters implement these traits to provide concrete
//! functionality.

use crate::command::{CommandOutput, Invocation};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

// =============================================================================
// Command Runner Port
// =============================================================================

/// Port for executing one tool invocation to completion
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the invocation, honouring `cancel` until the child exits
    async fn run(&self, cancel: &CancellationToken, invocation: Invocation)
        -> Result<CommandOutput>;
}

// =============================================================================
// Command Logger Port
// =============================================================================

/// Receives one event per invocation boundary as a sequence of tokens.
///
/// Implementations are called from arbitrary tasks concurrently, so each
/// call must be self-contained. The executor tags every event with an
/// invocation id so interleaved START/FINISH pairs stay attributable.
pub trait CommandLogger: Send + Sync {
    fn log(&self, event: &[String]);
}

/// Logger that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl CommandLogger for NoopLogger {
    fn log(&self, _event: &[String]) {}
}

/// Logger that forwards events to `tracing` at DEBUG level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl CommandLogger for TracingLogger {
    fn log(&self, event: &[String]) {
        debug!(target: "zfs_ops::command", event = %event.join(" "));
    }
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

pub type CommandRunnerRef = Arc<dyn CommandRunner>;
pub type CommandLoggerRef = Arc<dyn CommandLogger>;
