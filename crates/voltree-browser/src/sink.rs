//! Destinations for finished archives.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::DownloadError;

/// Receives a finished archive under its download name.
#[async_trait]
pub trait DownloadSink: Send + Sync {
    async fn deliver(&self, file_name: &str, bytes: Vec<u8>) -> Result<(), DownloadError>;
}

/// Writes archives into a directory on disk.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where an archive named `file_name` ends up.
    pub fn target(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

#[async_trait]
impl DownloadSink for DirectorySink {
    async fn deliver(&self, file_name: &str, bytes: Vec<u8>) -> Result<(), DownloadError> {
        if file_name.contains('/') || file_name.contains('\\') {
            return Err(DownloadError::Sink(format!("invalid file name: {file_name}")));
        }
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.target(file_name), bytes).await?;
        Ok(())
    }
}

/// Keeps delivered archives in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    delivered: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, oldest first.
    pub fn delivered(&self) -> Vec<(String, Vec<u8>)> {
        self.delivered.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.lock().is_empty()
    }
}

#[async_trait]
impl DownloadSink for MemorySink {
    async fn deliver(&self, file_name: &str, bytes: Vec<u8>) -> Result<(), DownloadError> {
        self.delivered.lock().push((file_name.to_string(), bytes));
        Ok(())
    }
}
