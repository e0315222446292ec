//! Browser session configuration.
//!
//! Loaded from RON:
//!
//! ```ron
//! (
//!     server_id: "mc-survival",
//!     fetch_depth: 1,
//!     mounts: [
//!         (container_path: "/data", host_path: "/srv/mc/data"),
//!         (container_path: "/etc/game/config", host_path: "/srv/mc/config", read_only: true),
//!     ],
//! )
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use voltree_types::{ServerId, VolumeMount};

/// Depth used by ordinary navigation.
pub const DEFAULT_FETCH_DEPTH: u32 = 1;

fn default_fetch_depth() -> u32 {
    DEFAULT_FETCH_DEPTH
}

/// Configuration for one browser session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Server whose volumes are browsed.
    pub server_id: String,
    /// Listing depth requested on navigation. Fixed for the session.
    #[serde(default = "default_fetch_depth")]
    pub fetch_depth: u32,
    /// The server's volume mounts.
    #[serde(default)]
    pub mounts: Vec<VolumeMount>,
}

impl BrowserConfig {
    pub fn new(server_id: impl Into<String>, mounts: Vec<VolumeMount>) -> Self {
        Self {
            server_id: server_id.into(),
            fetch_depth: DEFAULT_FETCH_DEPTH,
            mounts,
        }
    }

    pub fn server(&self) -> ServerId {
        ServerId::new(self.server_id.clone())
    }

    /// Parse and validate a RON document.
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let config: BrowserConfig = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_ron(&text)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_depth == 0 {
            return Err(ConfigError::InvalidFetchDepth(self.fetch_depth));
        }
        Ok(())
    }
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON parse error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("fetch_depth must be at least 1, got {0}")]
    InvalidFetchDepth(u32),
}
