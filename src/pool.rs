//! Pool façade
//!
//! Pools are identified by name only; the pool tool is asked nothing else
//! about them.

use crate::command::args;
use crate::command::table::expect_columns;
use crate::dataset::Zfs;
use crate::error::Result;
use serde::Serialize;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// An imported pool
#[derive(Clone, Serialize)]
pub struct Pool {
    pub name: String,
    #[serde(skip)]
    zfs: Zfs,
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool").field("name", &self.name).finish()
    }
}

impl Pool {
    fn new(zfs: Zfs, name: String) -> Self {
        Self { name, zfs }
    }

    /// Export the pool; it disappears from [`Zfs::pools`] until imported
    pub async fn export(&self, cancel: &CancellationToken) -> Result<()> {
        self.zfs.zpool(cancel, args::export_pool(&self.name)).await?;
        info!("Exported pool {}", self.name);
        Ok(())
    }
}

impl Zfs {
    /// All imported pools, in the tool's order
    pub async fn pools(&self, cancel: &CancellationToken) -> Result<Vec<Pool>> {
        let output = self.zpool(cancel, args::list_pools(None)).await?;
        output
            .table()
            .into_iter()
            .map(|mut row| {
                expect_columns(&row, 1)?;
                Ok(Pool::new(self.clone(), row.swap_remove(0)))
            })
            .collect()
    }

    /// An imported pool by name; fails if it is not imported
    pub async fn get_pool(&self, cancel: &CancellationToken, name: &str) -> Result<Pool> {
        self.zpool(cancel, args::list_pools(Some(name))).await?;
        Ok(Pool::new(self.clone(), name.to_string()))
    }

    pub async fn import_pool(&self, cancel: &CancellationToken, name: &str) -> Result<Pool> {
        self.zpool(cancel, args::import_pool(name)).await?;
        info!("Imported pool {}", name);
        Ok(Pool::new(self.clone(), name.to_string()))
    }
}
