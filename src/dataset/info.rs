//! Dataset Info
//!
//! Immutable snapshot of one dataset's attributes, decoded positionally
//! from a `list -Hp` row.

use crate::command::table::{expect_columns, parse_string, parse_u64};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Constants
// =============================================================================

/// Columns requested from `list`, in the order rows are decoded.
/// Reordering this breaks [`Info::from_row`].
pub const PROPERTY_COLUMNS: [&str; 12] = [
    "name",
    "origin",
    "used",
    "available",
    "mountpoint",
    "compression",
    "volsize",
    "quota",
    "referenced",
    "written",
    "logicalused",
    "usedbydataset",
];

/// Separator between a filesystem and a snapshot name
pub const SNAPSHOT_SEPARATOR: char = '@';

// =============================================================================
// Dataset Kind
// =============================================================================

/// Dataset type passed to `list -t`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatasetKind {
    Filesystem,
    Snapshot,
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetKind::Filesystem => write!(f, "filesystem"),
            DatasetKind::Snapshot => write!(f, "snapshot"),
        }
    }
}

// =============================================================================
// Depth
// =============================================================================

/// How many namespace levels below the filter a listing includes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Depth(pub u16);

impl Depth {
    /// Only the named dataset
    pub const EXACT: Depth = Depth(0);
    /// The named dataset and its direct children
    pub const CHILDREN: Depth = Depth(1);
    /// The whole subtree
    pub const UNBOUNDED: Depth = Depth(u16::MAX);
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Info
// =============================================================================

/// Attributes of one dataset at query time. Byte counts the tool reports
/// as absent are zero; absent strings are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    /// Full name, `pool/path[@snapshot]`
    pub name: String,
    /// Snapshot this dataset was cloned from
    pub origin: String,
    pub used: u64,
    pub avail: u64,
    pub mountpoint: String,
    pub compression: String,
    pub volsize: u64,
    pub quota: u64,
    pub referenced: u64,
    pub written: u64,
    pub logicalused: u64,
    pub usedbydataset: u64,
}

impl Info {
    /// Decode one row produced for [`PROPERTY_COLUMNS`]
    pub fn from_row(row: &[String]) -> Result<Self> {
        expect_columns(row, PROPERTY_COLUMNS.len())?;

        Ok(Self {
            name: parse_string(&row[0]),
            origin: parse_string(&row[1]),
            used: parse_u64("used", &row[2])?,
            avail: parse_u64("available", &row[3])?,
            mountpoint: parse_string(&row[4]),
            compression: parse_string(&row[5]),
            volsize: parse_u64("volsize", &row[6])?,
            quota: parse_u64("quota", &row[7])?,
            referenced: parse_u64("referenced", &row[8])?,
            written: parse_u64("written", &row[9])?,
            logicalused: parse_u64("logicalused", &row[10])?,
            usedbydataset: parse_u64("usedbydataset", &row[11])?,
        })
    }

    /// Decode every row, failing on the first malformed one
    pub fn from_rows(rows: &[Vec<String>]) -> Result<Vec<Self>> {
        rows.iter().map(|row| Self::from_row(row)).collect()
    }

    /// Pool this dataset lives in (first path segment)
    pub fn pool(&self) -> &str {
        let end = self
            .name
            .find(|c| c == '/' || c == SNAPSHOT_SEPARATOR)
            .unwrap_or(self.name.len());
        &self.name[..end]
    }

    /// Split a snapshot name into `(filesystem, snapshot)`
    pub fn snapshot_parts(&self) -> Option<(&str, &str)> {
        self.name.split_once(SNAPSHOT_SEPARATOR)
    }
}

/// Compose `parent@name`
pub fn snapshot_name(parent: &str, name: &str) -> String {
    format!("{}{}{}", parent, SNAPSHOT_SEPARATOR, name)
}

#[cfg(test)]
pub(crate) fn row(fields: &[&str]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}
