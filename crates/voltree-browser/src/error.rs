//! Browser error types.
//!
//! Listing failures never surface here: the cache absorbs them into its
//! view. Writes and downloads propagate.

use thiserror::Error;

use crate::remote::RemoteError;

/// Failure of a write made through the browser.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// The path is a synthetic directory or outside every volume.
    #[error("not inside a volume: {0}")]
    NotWritable(String),

    /// The remote API rejected the write.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Failure of a recursive zip download. Nothing is delivered when this is
/// returned.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// A directory listing or file read failed.
    #[error("remote call failed: {0}")]
    Remote(#[from] RemoteError),

    /// The archive could not be assembled.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// I/O error while writing the archive.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sink refused the finished archive.
    #[error("download sink failed: {0}")]
    Sink(String),
}
