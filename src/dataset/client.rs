//! ZFS Client
//!
//! Entry point for dataset queries. Every call re-invokes the tool; no
//! result is cached.

use crate::command::{args, CommandOutput, Executor, Invocation};
use crate::config::{ZfsConfig, DEFAULT_PIPE_CAPACITY};
use crate::dataset::destroy::DestroyFlags;
use crate::dataset::filesystem::Filesystem;
use crate::dataset::info::{DatasetKind, Depth, Info};
use crate::dataset::snapshot::Snapshot;
use crate::domain::ports::{CommandLoggerRef, CommandRunnerRef, NoopLogger};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::command::table::ABSENT;

// =============================================================================
// Client
// =============================================================================

/// Handle used by every dataset and pool operation. Cheap to clone.
#[derive(Clone)]
pub struct Zfs {
    runner: CommandRunnerRef,
    pipe_capacity: usize,
}

impl fmt::Debug for Zfs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Zfs")
            .field("pipe_capacity", &self.pipe_capacity)
            .finish_non_exhaustive()
    }
}

impl Zfs {
    /// Create a client backed by real processes
    pub fn new(config: ZfsConfig) -> Self {
        Self::with_logger(config, Arc::new(NoopLogger))
    }

    /// Create a client backed by real processes, reporting every invocation
    pub fn with_logger(config: ZfsConfig, logger: CommandLoggerRef) -> Self {
        let pipe_capacity = config.pipe_capacity;
        Self {
            runner: Arc::new(Executor::with_logger(config, logger)),
            pipe_capacity,
        }
    }

    /// Create a client over any command runner
    pub fn with_runner(runner: CommandRunnerRef) -> Self {
        Self {
            runner,
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
        }
    }

    pub fn with_pipe_capacity(mut self, capacity: usize) -> Self {
        self.pipe_capacity = capacity.max(1);
        self
    }

    /// Capacity of the pipe used by snapshot transfers
    pub fn pipe_capacity(&self) -> usize {
        self.pipe_capacity
    }

    pub(crate) async fn run(
        &self,
        cancel: &CancellationToken,
        invocation: Invocation,
    ) -> Result<CommandOutput> {
        self.runner.run(cancel, invocation).await
    }

    pub(crate) async fn zfs(
        &self,
        cancel: &CancellationToken,
        args: Vec<String>,
    ) -> Result<CommandOutput> {
        self.run(cancel, Invocation::zfs(args)).await
    }

    pub(crate) async fn zpool(
        &self,
        cancel: &CancellationToken,
        args: Vec<String>,
    ) -> Result<CommandOutput> {
        self.run(cancel, Invocation::zpool(args)).await
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// List datasets of one kind in the tool's depth-first order
    pub async fn list(
        &self,
        cancel: &CancellationToken,
        kind: DatasetKind,
        filter: Option<&str>,
        depth: Depth,
    ) -> Result<Vec<Info>> {
        let output = self.zfs(cancel, args::list(kind, filter, depth)).await?;
        let infos = Info::from_rows(&output.table())?;
        debug!("Listed {} {} datasets", infos.len(), kind);
        Ok(infos)
    }

    async fn get_one(
        &self,
        cancel: &CancellationToken,
        kind: DatasetKind,
        name: &str,
    ) -> Result<Info> {
        let mut infos = self.list(cancel, kind, Some(name), Depth::EXACT).await?;
        if infos.is_empty() {
            return Err(Error::UnexpectedOutput(format!(
                "no {} row returned for {}",
                kind, name
            )));
        }
        Ok(infos.swap_remove(0))
    }

    /// All filesystems of all imported pools
    pub async fn filesystems(&self, cancel: &CancellationToken) -> Result<Vec<Filesystem>> {
        let infos = self
            .list(cancel, DatasetKind::Filesystem, None, Depth::UNBOUNDED)
            .await?;
        Ok(infos.into_iter().map(|info| self.filesystem(info)).collect())
    }

    /// One filesystem by exact name
    pub async fn get_filesystem(&self, cancel: &CancellationToken, name: &str) -> Result<Filesystem> {
        let info = self.get_one(cancel, DatasetKind::Filesystem, name).await?;
        Ok(self.filesystem(info))
    }

    /// All snapshots of all imported pools
    pub async fn snapshots(&self, cancel: &CancellationToken) -> Result<Vec<Snapshot>> {
        self.snapshots_under(cancel, None, Depth::UNBOUNDED).await
    }

    pub(crate) async fn snapshots_under(
        &self,
        cancel: &CancellationToken,
        filter: Option<&str>,
        depth: Depth,
    ) -> Result<Vec<Snapshot>> {
        let infos = self
            .list(cancel, DatasetKind::Snapshot, filter, depth)
            .await?;
        Ok(infos.into_iter().map(|info| self.snapshot(info)).collect())
    }

    /// One snapshot by exact `filesystem@name`
    pub async fn get_snapshot(&self, cancel: &CancellationToken, name: &str) -> Result<Snapshot> {
        let info = self.get_one(cancel, DatasetKind::Snapshot, name).await?;
        Ok(self.snapshot(info))
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Create a filesystem and return it as the tool now reports it.
    ///
    /// A `password` entry is not set as a property: it enables passphrase
    /// encryption and is fed to the tool's double-entry prompt on stdin.
    pub async fn create_filesystem(
        &self,
        cancel: &CancellationToken,
        name: &str,
        properties: &BTreeMap<String, String>,
    ) -> Result<Filesystem> {
        let mut invocation = Invocation::zfs(args::create(name, properties));
        if let Some(password) = properties.get(args::PASSWORD_PROPERTY) {
            invocation = invocation.with_stdin_bytes(args::create_passphrase_input(password));
        }

        self.run(cancel, invocation).await?;
        info!("Created filesystem {}", name);

        self.get_filesystem(cancel, name).await
    }

    pub(crate) async fn destroy(
        &self,
        cancel: &CancellationToken,
        name: &str,
        flags: DestroyFlags,
    ) -> Result<()> {
        self.zfs(cancel, args::destroy(name, flags)).await?;
        info!("Destroyed {}", name);
        Ok(())
    }

    pub(crate) async fn set_property(
        &self,
        cancel: &CancellationToken,
        name: &str,
        key: &str,
        value: &str,
    ) -> Result<()> {
        self.zfs(cancel, args::set_property(name, key, value))
            .await
            .map(|_| ())
    }

    /// Returns the value and whether the property exists on the dataset
    pub(crate) async fn get_property(
        &self,
        cancel: &CancellationToken,
        name: &str,
        key: &str,
    ) -> Result<(String, bool)> {
        let output = self.zfs(cancel, args::get_property(name, key)).await?;
        parse_property(&output)
    }
}

/// Decode a `get -H` row: name, property, value, source.
///
/// The tool prints `-` as both value and source for a property that is
/// not set; a set value of `-` still has a real source.
fn parse_property(output: &CommandOutput) -> Result<(String, bool)> {
    let records = output.records();
    let row = records
        .first()
        .ok_or_else(|| Error::UnexpectedOutput("get returned no rows".into()))?;

    if row.len() < 3 {
        return Err(Error::ColumnMismatch {
            expected: 4,
            found: row.len(),
            line: row.join(" "),
        });
    }

    let value = &row[2];
    let source = row.get(3).map(String::as_str).unwrap_or(ABSENT);
    if value == ABSENT && (source == ABSENT || source.is_empty()) {
        return Ok((String::new(), false));
    }

    Ok((value.clone(), true))
}
