//! In-memory remote file API.
//!
//! Used for tests and demos. All data is ephemeral. Every call is recorded
//! so callers can assert on network traffic, and individual paths can be
//! made to fail to exercise error handling.

use std::collections::{HashMap, HashSet};
use std::time::SystemTime;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use voltree_types::path::{normalize, parent};
use voltree_types::{DirEntry, EntryKind, ServerId};

use crate::remote::{RemoteError, RemoteFs, RemoteResult};

/// Node in the memory tree.
#[derive(Debug, Clone)]
enum Node {
    File { data: Vec<u8>, modified: SystemTime },
    Directory { modified: SystemTime },
}

impl Node {
    fn kind(&self) -> EntryKind {
        match self {
            Node::File { .. } => EntryKind::File,
            Node::Directory { .. } => EntryKind::Directory,
        }
    }
}

/// One recorded call against a [`MemoryRemote`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCall {
    List { path: String, fetch_depth: u32 },
    Read { path: String },
    CreateDirectory { path: String },
    Rename { from: String, to: String },
    Delete { path: String },
    Upload { path: String, len: usize },
}

/// In-memory remote file API.
///
/// Keys are API paths: `""` for the root, `/a/b` for everything else. The
/// server id is accepted but not used to partition data.
#[derive(Debug)]
pub struct MemoryRemote {
    nodes: RwLock<HashMap<String, Node>>,
    calls: Mutex<Vec<RemoteCall>>,
    failing_listings: RwLock<HashSet<String>>,
    failing_reads: RwLock<HashSet<String>>,
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemote {
    /// Create an empty tree containing only the root directory.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            String::new(),
            Node::Directory {
                modified: SystemTime::now(),
            },
        );
        Self {
            nodes: RwLock::new(nodes),
            calls: Mutex::new(Vec::new()),
            failing_listings: RwLock::new(HashSet::new()),
            failing_reads: RwLock::new(HashSet::new()),
        }
    }

    /// Add a directory, creating missing parents.
    pub fn with_dir(self, path: &str) -> Self {
        self.insert_dir(path);
        self
    }

    /// Add a file, creating missing parents.
    pub fn with_file(self, path: &str, data: impl Into<Vec<u8>>) -> Self {
        self.insert_file(path, data);
        self
    }

    pub fn insert_dir(&self, path: &str) {
        let key = Self::key(path);
        let mut nodes = self.nodes.write();
        Self::ensure_parents(&mut nodes, &key);
        nodes.entry(key).or_insert(Node::Directory {
            modified: SystemTime::now(),
        });
    }

    pub fn insert_file(&self, path: &str, data: impl Into<Vec<u8>>) {
        let key = Self::key(path);
        let mut nodes = self.nodes.write();
        Self::ensure_parents(&mut nodes, &key);
        nodes.insert(
            key,
            Node::File {
                data: data.into(),
                modified: SystemTime::now(),
            },
        );
    }

    /// Make every listing of `path` fail.
    pub fn fail_listings_of(&self, path: &str) {
        self.failing_listings.write().insert(Self::key(path));
    }

    /// Make every read of `path` fail.
    pub fn fail_reads_of(&self, path: &str) {
        self.failing_reads.write().insert(Self::key(path));
    }

    /// Stop injecting faults.
    pub fn clear_faults(&self) {
        self.failing_listings.write().clear();
        self.failing_reads.write().clear();
    }

    /// All calls so far, oldest first.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.calls.lock().clone()
    }

    /// Number of listing calls made for `path` (API form).
    pub fn list_calls(&self, path: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, RemoteCall::List { path: p, .. } if p == path))
            .count()
    }

    /// Number of read calls made.
    pub fn read_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, RemoteCall::Read { .. }))
            .count()
    }

    /// Current content of a file, if present.
    pub fn file_content(&self, path: &str) -> Option<Vec<u8>> {
        match self.nodes.read().get(&Self::key(path)) {
            Some(Node::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.nodes.read().contains_key(&Self::key(path))
    }

    fn record(&self, call: RemoteCall) {
        self.calls.lock().push(call);
    }

    /// API key for a path: the root is `""`.
    fn key(path: &str) -> String {
        normalize(path).api_path().to_string()
    }

    fn parent_key(key: &str) -> String {
        parent(key).api_path().to_string()
    }

    fn ensure_parents(nodes: &mut HashMap<String, Node>, key: &str) {
        let mut current = Self::parent_key(key);
        while !current.is_empty() {
            nodes.entry(current.clone()).or_insert(Node::Directory {
                modified: SystemTime::now(),
            });
            current = Self::parent_key(&current);
        }
    }

    fn require_dir(nodes: &HashMap<String, Node>, key: &str) -> RemoteResult<()> {
        match nodes.get(key) {
            Some(Node::Directory { .. }) => Ok(()),
            Some(Node::File { .. }) => Err(RemoteError::not_a_directory(key)),
            None => Err(RemoteError::not_found(key)),
        }
    }

    fn is_below(key: &str, dir: &str) -> bool {
        key.strip_prefix(dir).is_some_and(|rest| rest.starts_with('/'))
    }

    fn list_children(nodes: &HashMap<String, Node>, dir: &str, depth: u32) -> Vec<DirEntry> {
        let mut result: Vec<DirEntry> = nodes
            .iter()
            .filter(|(key, _)| !key.is_empty() && Self::parent_key(key) == dir)
            .map(|(key, node)| {
                let name = voltree_types::path::base_name(key).to_string();
                let mut entry = DirEntry::new(name, node.kind());
                match node {
                    Node::File { data, modified } => {
                        entry.size = Some(data.len() as u64);
                        entry.permissions = Some(0o644);
                        entry.modified = Some(*modified);
                    }
                    Node::Directory { modified } => {
                        entry.permissions = Some(0o755);
                        entry.modified = Some(*modified);
                        if depth > 1 {
                            entry.children = Some(Self::list_children(nodes, key, depth - 1));
                        }
                    }
                }
                entry
            })
            .collect();

        // Sort for consistent ordering
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }
}

#[async_trait]
impl RemoteFs for MemoryRemote {
    async fn list_directory(
        &self,
        _server: &ServerId,
        path: &str,
        fetch_depth: u32,
    ) -> RemoteResult<Vec<DirEntry>> {
        let key = Self::key(path);
        self.record(RemoteCall::List {
            path: key.clone(),
            fetch_depth,
        });

        if self.failing_listings.read().contains(&key) {
            return Err(RemoteError::other(format!("injected listing failure: {key}")));
        }

        let nodes = self.nodes.read();
        Self::require_dir(&nodes, &key)?;
        Ok(Self::list_children(&nodes, &key, fetch_depth.max(1)))
    }

    async fn read_file(&self, _server: &ServerId, path: &str) -> RemoteResult<Vec<u8>> {
        let key = Self::key(path);
        self.record(RemoteCall::Read { path: key.clone() });

        if self.failing_reads.read().contains(&key) {
            return Err(RemoteError::other(format!("injected read failure: {key}")));
        }

        match self.nodes.read().get(&key) {
            Some(Node::File { data, .. }) => Ok(data.clone()),
            Some(Node::Directory { .. }) => Err(RemoteError::is_a_directory(key)),
            None => Err(RemoteError::not_found(key)),
        }
    }

    async fn create_directory(&self, _server: &ServerId, path: &str) -> RemoteResult<()> {
        let key = Self::key(path);
        self.record(RemoteCall::CreateDirectory { path: key.clone() });

        let mut nodes = self.nodes.write();
        if nodes.contains_key(&key) {
            return Err(RemoteError::already_exists(key));
        }
        Self::require_dir(&nodes, &Self::parent_key(&key))?;
        nodes.insert(
            key,
            Node::Directory {
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    async fn rename(&self, _server: &ServerId, from: &str, to: &str) -> RemoteResult<()> {
        let from = Self::key(from);
        let to = Self::key(to);
        self.record(RemoteCall::Rename {
            from: from.clone(),
            to: to.clone(),
        });

        if from.is_empty() || to.is_empty() {
            return Err(RemoteError::invalid_path("cannot rename the root"));
        }
        if Self::is_below(&to, &from) {
            return Err(RemoteError::invalid_path(format!("{to} is inside {from}")));
        }

        let mut nodes = self.nodes.write();
        if !nodes.contains_key(&from) {
            return Err(RemoteError::not_found(from));
        }
        if nodes.contains_key(&to) {
            return Err(RemoteError::already_exists(to));
        }
        Self::require_dir(&nodes, &Self::parent_key(&to))?;

        let moved: Vec<String> = nodes
            .keys()
            .filter(|k| **k == from || Self::is_below(k, &from))
            .cloned()
            .collect();
        for old in moved {
            if let Some(node) = nodes.remove(&old) {
                let new = format!("{to}{}", &old[from.len()..]);
                nodes.insert(new, node);
            }
        }
        Ok(())
    }

    async fn delete(&self, _server: &ServerId, path: &str) -> RemoteResult<()> {
        let key = Self::key(path);
        self.record(RemoteCall::Delete { path: key.clone() });

        if key.is_empty() {
            return Err(RemoteError::invalid_path("cannot delete the root"));
        }

        let mut nodes = self.nodes.write();
        if nodes.remove(&key).is_none() {
            return Err(RemoteError::not_found(key));
        }
        nodes.retain(|k, _| !Self::is_below(k, &key));
        Ok(())
    }

    async fn upload(&self, _server: &ServerId, path: &str, data: &[u8]) -> RemoteResult<()> {
        let key = Self::key(path);
        self.record(RemoteCall::Upload {
            path: key.clone(),
            len: data.len(),
        });

        let mut nodes = self.nodes.write();
        if let Some(Node::Directory { .. }) = nodes.get(&key) {
            return Err(RemoteError::is_a_directory(key));
        }
        Self::require_dir(&nodes, &Self::parent_key(&key))?;
        nodes.insert(
            key,
            Node::File {
                data: data.to_vec(),
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server() -> ServerId {
        ServerId::new("srv-1")
    }

    fn names(entries: &[DirEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_list_and_read() {
        let remote = MemoryRemote::new()
            .with_file("/data/a.txt", "alpha")
            .with_file("/data/sub/b.txt", "beta");

        let root = remote.list_directory(&server(), "", 1).await.unwrap();
        assert_eq!(names(&root), vec!["data"]);

        let data = remote.list_directory(&server(), "/data", 1).await.unwrap();
        assert_eq!(names(&data), vec!["a.txt", "sub"]);
        assert_eq!(data[0].size, Some(5));
        assert!(data[1].children.is_none());

        let bytes = remote.read_file(&server(), "/data/sub/b.txt").await.unwrap();
        assert_eq!(bytes, b"beta");
    }

    #[tokio::test]
    async fn test_nested_depth() {
        let remote = MemoryRemote::new().with_file("/data/sub/deep/c.txt", "c");

        let listing = remote.list_directory(&server(), "/data", 2).await.unwrap();
        let sub = &listing[0];
        let children = sub.children.as_ref().unwrap();
        assert_eq!(names(children), vec!["deep"]);
        assert!(children[0].children.is_none());
    }

    #[tokio::test]
    async fn test_list_missing_and_file() {
        let remote = MemoryRemote::new().with_file("/data/a.txt", "a");
        assert!(matches!(
            remote.list_directory(&server(), "/nope", 1).await,
            Err(RemoteError::NotFound(_))
        ));
        assert!(matches!(
            remote.list_directory(&server(), "/data/a.txt", 1).await,
            Err(RemoteError::NotADirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_injected_faults_and_call_log() {
        let remote = MemoryRemote::new().with_file("/data/a.txt", "a");
        remote.fail_reads_of("/data/a.txt");
        remote.fail_listings_of("/data");

        assert!(remote.read_file(&server(), "/data/a.txt").await.is_err());
        assert!(remote.list_directory(&server(), "/data/", 1).await.is_err());
        assert_eq!(remote.list_calls("/data"), 1);
        assert_eq!(remote.read_calls(), 1);

        remote.clear_faults();
        assert!(remote.read_file(&server(), "/data/a.txt").await.is_ok());
    }

    #[tokio::test]
    async fn test_mutations() {
        let remote = MemoryRemote::new().with_file("/data/world/level.dat", "lvl");

        remote.create_directory(&server(), "/data/backups").await.unwrap();
        assert!(matches!(
            remote.create_directory(&server(), "/data/backups").await,
            Err(RemoteError::AlreadyExists(_))
        ));

        remote.rename(&server(), "/data/world", "/data/world_old").await.unwrap();
        assert!(!remote.exists("/data/world"));
        assert_eq!(remote.file_content("/data/world_old/level.dat").unwrap(), b"lvl");

        remote.upload(&server(), "/data/ops.json", b"[]").await.unwrap();
        assert_eq!(remote.file_content("/data/ops.json").unwrap(), b"[]");

        remote.delete(&server(), "/data/world_old").await.unwrap();
        assert!(!remote.exists("/data/world_old/level.dat"));
        assert!(remote.delete(&server(), "").await.is_err());
    }

    #[tokio::test]
    async fn test_rename_into_self_fails() {
        let remote = MemoryRemote::new().with_dir("/data/a");
        let result = remote.rename(&server(), "/data/a", "/data/a/b").await;
        assert!(matches!(result, Err(RemoteError::InvalidPath(_))));
    }
}
