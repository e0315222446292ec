//! Mount trie: one addressable tree over disjoint volume mounts.
//!
//! The server exposes volumes such as `/data` and `/etc/game/config`
//! independently. The trie lets the browser show a single tree: `/`, `/etc`
//! and `/etc/game` become synthetic directories whose only children are the
//! next segments toward a mount, and everything at or below a mount root is
//! left to the remote API.
//!
//! A prefix set would not do: navigation needs the immediate children of an
//! arbitrary ancestor, and must tell a waypoint (synthetic children) from a
//! dead end (no mount below) from a live mount.

use std::collections::BTreeMap;

use voltree_types::entry::sort_case_insensitive;
use voltree_types::path::{normalize, split_segments};
use voltree_types::{DirEntry, VirtualPath, VolumeMount};

/// A node in the mount trie.
#[derive(Debug, Clone, Default)]
pub struct TrieNode {
    children: BTreeMap<String, TrieNode>,
    is_mount_root: bool,
}

impl TrieNode {
    pub fn is_mount_root(&self) -> bool {
        self.is_mount_root
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &TrieNode)> {
        self.children.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// One synthetic directory entry per child, sorted case-insensitively.
    fn synthetic_entries(&self) -> Vec<DirEntry> {
        let mut entries: Vec<DirEntry> = self
            .children
            .keys()
            .map(|name| DirEntry::directory(name.clone()))
            .collect();
        sort_case_insensitive(&mut entries);
        entries
    }
}

/// How a path relates to the configured mounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A waypoint toward one or more mounts. Listed from the trie, never
    /// fetched.
    Synthetic(Vec<DirEntry>),
    /// A mount root or anything below one. Listed by the remote API.
    Real,
    /// Outside every mount and not on the way to one.
    Unreachable,
}

impl Classification {
    pub fn is_real(&self) -> bool {
        matches!(self, Classification::Real)
    }

    /// The listing the trie can answer without the network: the synthetic
    /// children, or nothing for an unreachable path. `None` for real paths.
    pub fn into_local_listing(self) -> Option<Vec<DirEntry>> {
        match self {
            Classification::Synthetic(entries) => Some(entries),
            Classification::Unreachable => Some(Vec::new()),
            Classification::Real => None,
        }
    }
}

/// Prefix tree over the container paths of a server's volume mounts.
///
/// Built once per browser session. A mount at `/` is ignored: it cannot be
/// told apart from the synthetic root.
#[derive(Debug, Clone, Default)]
pub struct MountTrie {
    root: TrieNode,
}

impl MountTrie {
    /// Build from volume mounts.
    pub fn new(mounts: &[VolumeMount]) -> Self {
        Self::from_paths(mounts.iter().map(|m| m.container_path.as_str()))
    }

    /// Build from raw container paths.
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut trie = Self::default();
        for path in paths {
            trie.insert(path.as_ref());
        }
        trie
    }

    fn insert(&mut self, container_path: &str) {
        let path = normalize(container_path);
        if path.is_root() {
            tracing::warn!(
                container_path,
                "ignoring volume mounted at /; it cannot be browsed as a sub-tree"
            );
            return;
        }

        let mut node = &mut self.root;
        for segment in split_segments(path.as_str()) {
            node = node.children.entry(segment.to_string()).or_default();
        }
        node.is_mount_root = true;
    }

    /// The node reached by walking `path` segment by segment, if any.
    ///
    /// Paths below a mount root have no node: the trie only knows mount
    /// roots and their ancestors.
    pub fn node(&self, path: &str) -> Option<&TrieNode> {
        let path = normalize(path);
        let mut node = &self.root;
        for segment in split_segments(path.as_str()) {
            node = node.children.get(segment)?;
        }
        Some(node)
    }

    /// Classify a path against the mounts.
    pub fn classify(&self, path: &str) -> Classification {
        let path = normalize(path);
        let mut node = &self.root;
        for segment in split_segments(path.as_str()) {
            if node.is_mount_root {
                // Inside a live mount
                return Classification::Real;
            }
            match node.children.get(segment) {
                Some(child) => node = child,
                None => return Classification::Unreachable,
            }
        }

        if node.is_mount_root {
            Classification::Real
        } else {
            Classification::Synthetic(node.synthetic_entries())
        }
    }

    /// True if `path` is exactly a mount's container path.
    pub fn is_real_mount_root(&self, path: &str) -> bool {
        self.node(path).is_some_and(TrieNode::is_mount_root)
    }

    /// Synthetic directory entries for the children of `path`'s node, or
    /// nothing when the path has no node.
    pub fn synthetic_children(&self, path: &str) -> Vec<DirEntry> {
        self.node(path)
            .map(TrieNode::synthetic_entries)
            .unwrap_or_default()
    }

    /// Every registered mount root, in path order.
    pub fn mount_roots(&self) -> Vec<VirtualPath> {
        let mut roots = Vec::new();
        Self::collect_roots(&self.root, VirtualPath::root(), &mut roots);
        roots
    }

    fn collect_roots(node: &TrieNode, path: VirtualPath, out: &mut Vec<VirtualPath>) {
        if node.is_mount_root {
            out.push(path.clone());
        }
        for (name, child) in &node.children {
            Self::collect_roots(child, path.join(name), out);
        }
    }

    /// True when no usable mount was registered.
    pub fn is_empty(&self) -> bool {
        self.root.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(entries: &[DirEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_root_children_sorted() {
        let trie = MountTrie::from_paths(["/data", "/config"]);
        let children = trie.synthetic_children("/");
        assert_eq!(names(&children), vec!["config", "data"]);
        assert!(children.iter().all(|e| e.is_dir() && e.size.is_none()));
    }

    #[test]
    fn test_case_insensitive_order() {
        let trie = MountTrie::from_paths(["/logs", "/Config", "/data"]);
        assert_eq!(names(&trie.synthetic_children("/")), vec!["Config", "data", "logs"]);
    }

    #[test]
    fn test_strict_ancestor_is_synthetic() {
        let trie = MountTrie::from_paths(["/etc/game/config", "/data"]);

        for ancestor in ["/", "/etc", "/etc/game"] {
            assert!(trie.node(ancestor).is_some(), "{ancestor} should have a node");
            assert!(!trie.is_real_mount_root(ancestor));
            assert!(matches!(trie.classify(ancestor), Classification::Synthetic(_)));
        }

        assert_eq!(
            trie.classify("/etc/game"),
            Classification::Synthetic(vec![DirEntry::directory("config")])
        );
    }

    #[test]
    fn test_mount_root_and_below_are_real() {
        let trie = MountTrie::from_paths(["/data"]);
        assert!(trie.is_real_mount_root("/data"));
        assert!(trie.is_real_mount_root("/data/"));
        assert_eq!(trie.classify("/data"), Classification::Real);
        assert_eq!(trie.classify("/data/world/region"), Classification::Real);

        // Below a mount root the trie has no node of its own
        assert!(trie.node("/data/world").is_none());
        assert!(!trie.is_real_mount_root("/data/world"));
    }

    #[test]
    fn test_unreachable() {
        let trie = MountTrie::from_paths(["/data"]);
        assert_eq!(trie.classify("/nonexistent-waypoint"), Classification::Unreachable);
        assert!(trie.synthetic_children("/nonexistent-waypoint").is_empty());
        assert_eq!(
            trie.classify("/nonexistent-waypoint").into_local_listing(),
            Some(Vec::new())
        );
    }

    #[test]
    fn test_nested_mounts() {
        let trie = MountTrie::from_paths(["/mnt", "/mnt/project"]);
        assert!(trie.is_real_mount_root("/mnt"));
        assert!(trie.is_real_mount_root("/mnt/project"));
        assert_eq!(trie.classify("/mnt/project/src"), Classification::Real);
    }

    #[test]
    fn test_root_mount_ignored() {
        let trie = MountTrie::from_paths(["/", "", "/data"]);
        assert!(!trie.is_real_mount_root("/"));
        assert_eq!(
            trie.classify("/"),
            Classification::Synthetic(vec![DirEntry::directory("data")])
        );
        assert_eq!(trie.mount_roots(), vec![VirtualPath::new("/data")]);
    }

    #[test]
    fn test_empty_trie() {
        let trie = MountTrie::new(&[]);
        assert!(trie.is_empty());
        assert_eq!(trie.classify("/"), Classification::Synthetic(Vec::new()));
    }

    #[test]
    fn test_mount_roots() {
        let trie = MountTrie::new(&[
            VolumeMount::new("/data", "/srv/a"),
            VolumeMount::new("/etc/game/config/", "/srv/b"),
        ]);
        assert_eq!(
            trie.mount_roots(),
            vec![VirtualPath::new("/data"), VirtualPath::new("/etc/game/config")]
        );
    }
}
