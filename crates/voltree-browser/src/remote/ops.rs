//! Remote file API trait.
//!
//! The game server exposes each volume mount through a request/response
//! file API. The browser core only consumes it; implementations decide how
//! calls travel (HTTP, in-process, host directories).

use async_trait::async_trait;
use voltree_types::{DirEntry, ServerId};

use super::RemoteResult;

/// Remote file-system service for one or more game servers.
///
/// Paths are API-relative: the root is the empty string, everything else is
/// a normalized virtual path such as `/data/world`. Listings return the
/// immediate children of `path`; when `fetch_depth > 1`, directory entries
/// carry their own nested `children` down to that depth.
#[async_trait]
pub trait RemoteFs: Send + Sync {
    // ========================================================================
    // Reading
    // ========================================================================

    /// List a directory.
    async fn list_directory(
        &self,
        server: &ServerId,
        path: &str,
        fetch_depth: u32,
    ) -> RemoteResult<Vec<DirEntry>>;

    /// Read the whole content of one file.
    async fn read_file(&self, server: &ServerId, path: &str) -> RemoteResult<Vec<u8>>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Create a directory (parents must exist).
    async fn create_directory(&self, server: &ServerId, path: &str) -> RemoteResult<()>;

    /// Rename a file or directory within one volume.
    async fn rename(&self, server: &ServerId, from: &str, to: &str) -> RemoteResult<()>;

    /// Delete a file, or a directory with everything below it.
    async fn delete(&self, server: &ServerId, path: &str) -> RemoteResult<()>;

    /// Create or replace a file with `data`.
    async fn upload(&self, server: &ServerId, path: &str, data: &[u8]) -> RemoteResult<()>;
}
