//! Snapshot entity
//!
//! Point-in-time, read-only image of a filesystem. Besides the property
//! and lifecycle calls shared with filesystems, a snapshot can be rolled
//! back to, cloned, held against destruction and streamed (see
//! [`crate::stream`]).

use crate::command::args;
use crate::command::table::expect_columns;
use crate::dataset::client::Zfs;
use crate::dataset::destroy::DestroyFlags;
use crate::dataset::filesystem::Filesystem;
use crate::dataset::info::Info;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Options for [`Snapshot::clone_to`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneOptions {
    /// Properties set on the new filesystem at creation
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// A snapshot dataset as of the query that produced it
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub info: Info,
    zfs: Zfs,
}

impl Snapshot {
    pub(crate) fn new(zfs: Zfs, info: Info) -> Self {
        Self { info, zfs }
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Name of the filesystem this snapshot was taken of
    pub fn filesystem_name(&self) -> &str {
        self.info
            .snapshot_parts()
            .map(|(filesystem, _)| filesystem)
            .unwrap_or(&self.info.name)
    }

    pub(crate) fn client(&self) -> &Zfs {
        &self.zfs
    }

    pub async fn destroy(&self, cancel: &CancellationToken, flags: DestroyFlags) -> Result<()> {
        self.zfs.destroy(cancel, &self.info.name, flags).await
    }

    pub async fn set_property(&self, cancel: &CancellationToken, key: &str, value: &str) -> Result<()> {
        self.zfs
            .set_property(cancel, &self.info.name, key, value)
            .await
    }

    pub async fn get_property(&self, cancel: &CancellationToken, key: &str) -> Result<(String, bool)> {
        self.zfs.get_property(cancel, &self.info.name, key).await
    }

    /// Roll the parent filesystem back, destroying any later snapshots
    pub async fn rollback(&self, cancel: &CancellationToken) -> Result<()> {
        self.zfs.zfs(cancel, args::rollback(&self.info.name)).await?;
        info!("Rolled back to {}", self.info.name);
        Ok(())
    }

    /// Create a writable filesystem at `dest` backed by this snapshot
    pub async fn clone_to(
        &self,
        cancel: &CancellationToken,
        dest: &str,
        options: &CloneOptions,
    ) -> Result<Filesystem> {
        self.zfs
            .zfs(cancel, args::clone(&self.info.name, dest, &options.properties))
            .await?;
        info!("Cloned {} to {}", self.info.name, dest);
        self.zfs.get_filesystem(cancel, dest).await
    }

    // =========================================================================
    // Holds
    // =========================================================================

    /// Place a named hold; the snapshot cannot be destroyed while any exist
    pub async fn hold(&self, cancel: &CancellationToken, tag: &str) -> Result<()> {
        self.zfs.zfs(cancel, args::hold(&self.info.name, tag)).await?;
        Ok(())
    }

    pub async fn release(&self, cancel: &CancellationToken, tag: &str) -> Result<()> {
        self.zfs
            .zfs(cancel, args::release(&self.info.name, tag))
            .await?;
        Ok(())
    }

    /// Tags of all holds on this snapshot
    pub async fn holds(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        let output = self.zfs.zfs(cancel, args::holds(&self.info.name)).await?;
        output
            .records()
            .into_iter()
            .map(|mut row| {
                // name, tag, timestamp
                expect_columns(&row, 3)?;
                Ok(row.swap_remove(1))
            })
            .collect()
    }
}

impl Zfs {
    pub(crate) fn snapshot(&self, info: Info) -> Snapshot {
        Snapshot::new(self.clone(), info)
    }
}
