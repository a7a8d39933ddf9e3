//! Dataset Module
//!
//! Typed model of filesystems and snapshots on top of the command layer.
//! Entities hold the attributes seen at query time plus a client handle;
//! every operation goes back to the tool.

pub mod client;
pub mod destroy;
pub mod filesystem;
pub mod info;
pub mod snapshot;

pub use client::Zfs;
pub use destroy::{DestroyFlag, DestroyFlags};
pub use filesystem::Filesystem;
pub use info::{DatasetKind, Depth, Info};
pub use snapshot::{CloneOptions, Snapshot};
