//! ZFS Ops - Structured access to the ZFS command line tools
//!
//! Runs the dataset and pool tools as child processes, decodes their
//! tabular output into typed entities, and streams snapshots between
//! datasets without buffering them in memory.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                Zfs client  /  Filesystem, Snapshot, Pool     │
//! ├──────────────────────────────────────────────────────────────┤
//! │   args (argv builders)     table (parser)     stream         │
//! │                                              (send | recv)   │
//! ├──────────────────────────────────────────────────────────────┤
//! │            CommandRunner port  ──►  Executor                 │
//! │                                  (spawn, pipe, cancel, log)  │
//! ├──────────────────────────────────────────────────────────────┤
//! │                     zfs / zpool processes                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`command`]: Invocations, argument builders, executor and parser
//! - [`dataset`]: Filesystems, snapshots and the client
//! - [`stream`]: Send, receive and concurrent transfer
//! - [`pool`]: Pool listing, import and export
//! - [`domain`]: Runner and logger ports
//! - [`config`]: Tool locations and limits
//! - [`error`]: Error types and handling

pub mod command;
pub mod config;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod pool;
pub mod stream;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use command::{CommandOutput, Executor, Invocation, Tool};

pub use config::{ToolCommand, ZfsConfig};

pub use dataset::{
    CloneOptions, DatasetKind, Depth, DestroyFlag, DestroyFlags, Filesystem, Info, Snapshot, Zfs,
};

pub use domain::ports::{
    CommandLogger, CommandLoggerRef, CommandRunner, CommandRunnerRef, NoopLogger, TracingLogger,
};

pub use error::{Error, ErrorKind, Result};

pub use pool::Pool;

pub use stream::{pipe, PipeReader, PipeWriter, SendOptions};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
