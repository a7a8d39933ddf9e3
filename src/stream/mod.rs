//! Stream Module
//!
//! Snapshot send/receive. A single side is one invocation with stdout or
//! stdin attached to a caller stream; [`transfer`] joins the two sides
//! through an in-memory [`pipe`] and drives them concurrently.

pub mod pipe;
pub mod send;
pub mod transfer;

use crate::dataset::Snapshot;
use serde::{Deserialize, Serialize};

pub use pipe::{pipe, PipeReader, PipeWriter};

/// Flags for a send invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOptions {
    /// Base snapshot for an incremental stream
    #[serde(default)]
    incremental_from: Option<String>,
    /// Embed dataset properties in the stream
    #[serde(default)]
    properties: bool,
    /// Keep encrypted blocks encrypted
    #[serde(default)]
    raw: bool,
}

impl SendOptions {
    /// Send only the changes since `base`
    pub fn incremental_from(self, base: &Snapshot) -> Self {
        self.incremental_from_name(base.name())
    }

    pub fn incremental_from_name(mut self, base: impl Into<String>) -> Self {
        self.incremental_from = Some(base.into());
        self
    }

    pub fn properties(mut self, include: bool) -> Self {
        self.properties = include;
        self
    }

    pub fn raw(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    pub fn incremental_base(&self) -> Option<&str> {
        self.incremental_from.as_deref()
    }

    pub fn includes_properties(&self) -> bool {
        self.properties
    }

    pub fn is_raw(&self) -> bool {
        self.raw
    }
}
