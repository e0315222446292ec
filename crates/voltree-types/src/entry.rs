//! Directory listing entries.
//!
//! The same record is produced by remote listings and by the mount trie.
//! Synthetic entries carry only a name and [`EntryKind::Directory`].

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

impl EntryKind {
    pub fn is_file(&self) -> bool {
        matches!(self, EntryKind::File)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, EntryKind::Directory)
    }
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Entry type.
    pub kind: EntryKind,
    /// Size in bytes, when the remote reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Unix permission bits (e.g. `0o644`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<u32>,
    /// Last modification time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<SystemTime>,
    /// Nested listing, present for directories when the fetch depth
    /// reached below this entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<DirEntry>>,
}

impl DirEntry {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            size: None,
            permissions: None,
            modified: None,
            children: None,
        }
    }

    /// A file entry with a known size.
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            size: Some(size),
            ..Self::new(name, EntryKind::File)
        }
    }

    /// A bare directory entry, as synthesized from the mount layout.
    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, EntryKind::Directory)
    }

    pub fn with_permissions(mut self, permissions: u32) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = Some(modified);
        self
    }

    pub fn with_children(mut self, children: Vec<DirEntry>) -> Self {
        self.children = Some(children);
        self
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Sort entries by name, ignoring ASCII case, with a case-sensitive tiebreak
/// so the order is total.
pub fn sort_case_insensitive(entries: &mut [DirEntry]) {
    entries.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
}
