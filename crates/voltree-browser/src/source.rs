//! Listing dispatch shared by the cache and the zipper.
//!
//! Every directory listing goes through [`ListingSource`]: the trie answers
//! synthetic and unreachable paths locally, real paths go to the remote API.
//! The two routes never overlap for a given path.

use std::sync::Arc;

use voltree_types::{DirEntry, ServerId, VirtualPath, VolumeMount};

use crate::remote::{RemoteFs, RemoteResult};
use crate::trie::{Classification, MountTrie};

/// Where a listing came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listing {
    /// Produced by the mount trie, no network involved.
    Local(Vec<DirEntry>),
    /// Returned by the remote listing endpoint.
    Remote(Vec<DirEntry>),
}

impl Listing {
    pub fn entries(&self) -> &[DirEntry] {
        match self {
            Listing::Local(entries) | Listing::Remote(entries) => entries,
        }
    }

    pub fn into_entries(self) -> Vec<DirEntry> {
        match self {
            Listing::Local(entries) | Listing::Remote(entries) => entries,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Listing::Remote(_))
    }
}

/// Mount trie plus remote API for one server.
#[derive(Clone)]
pub struct ListingSource {
    trie: Arc<MountTrie>,
    remote: Arc<dyn RemoteFs>,
    server: ServerId,
}

impl std::fmt::Debug for ListingSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingSource")
            .field("server", &self.server)
            .field("trie", &self.trie)
            .field("remote", &"<dyn RemoteFs>")
            .finish()
    }
}

impl ListingSource {
    pub fn new(trie: MountTrie, remote: Arc<dyn RemoteFs>, server: ServerId) -> Self {
        Self {
            trie: Arc::new(trie),
            remote,
            server,
        }
    }

    /// Build the trie from `mounts`.
    pub fn from_mounts(mounts: &[VolumeMount], remote: Arc<dyn RemoteFs>, server: ServerId) -> Self {
        Self::new(MountTrie::new(mounts), remote, server)
    }

    pub fn trie(&self) -> &MountTrie {
        &self.trie
    }

    pub fn server(&self) -> &ServerId {
        &self.server
    }

    pub fn remote(&self) -> &Arc<dyn RemoteFs> {
        &self.remote
    }

    pub fn classify(&self, path: &VirtualPath) -> Classification {
        self.trie.classify(path.as_str())
    }

    /// Call the remote listing endpoint for a real path.
    pub async fn fetch_remote(&self, path: &VirtualPath, depth: u32) -> RemoteResult<Vec<DirEntry>> {
        self.remote
            .list_directory(&self.server, path.api_path(), depth)
            .await
    }

    /// List `path`, locally when the trie can answer, remotely otherwise.
    pub async fn list(&self, path: &VirtualPath, depth: u32) -> RemoteResult<Listing> {
        match self.classify(path).into_local_listing() {
            Some(entries) => Ok(Listing::Local(entries)),
            None => self.fetch_remote(path, depth).await.map(Listing::Remote),
        }
    }

    /// Read one file through the remote API.
    pub async fn read(&self, path: &VirtualPath) -> RemoteResult<Vec<u8>> {
        self.remote.read_file(&self.server, path.api_path()).await
    }

    /// True when writes at `path` should reach the remote.
    pub fn is_writable(&self, path: &VirtualPath) -> bool {
        self.classify(path).is_real()
    }
}
