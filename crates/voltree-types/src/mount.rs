//! Volume mount descriptions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::path::{normalize, VirtualPath};

/// A container volume exposed at a fixed container path.
///
/// Derived once from server configuration and immutable for the lifetime of
/// a browser session. Two mounts never share a `container_path`; nothing
/// checks this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeMount {
    /// Where the volume appears inside the container (e.g. `/data`).
    pub container_path: String,
    /// Backing directory on the host.
    pub host_path: PathBuf,
    /// Whether writes through the file browser are refused.
    #[serde(default)]
    pub read_only: bool,
}

impl VolumeMount {
    pub fn new(container_path: impl Into<String>, host_path: impl Into<PathBuf>) -> Self {
        Self {
            container_path: container_path.into(),
            host_path: host_path.into(),
            read_only: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// The normalized container path.
    pub fn virtual_path(&self) -> VirtualPath {
        normalize(&self.container_path)
    }
}
