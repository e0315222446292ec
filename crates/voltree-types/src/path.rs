//! Virtual path utilities.
//!
//! A virtual path names a node in the unified tree presented to the user.
//! Normalized form: always starts with `/`, never ends with `/` unless it is
//! the root itself. Equality is plain string equality of normalized forms,
//! so `/Data` and `/data` are different paths.
//!
//! Interior repeated slashes are left alone by [`normalize`]; segment
//! splitting skips the empty components they produce.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The root path.
pub const ROOT: &str = "/";

/// Name reported by [`base_name`] for the root, which has no last segment.
pub const ROOT_NAME: &str = "root";

/// A normalized absolute path in the unified tree.
#[derive(Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct VirtualPath(String);

impl VirtualPath {
    /// Normalize `path` into a virtual path.
    pub fn new(path: impl AsRef<str>) -> Self {
        normalize(path.as_ref())
    }

    /// The root path `/`.
    pub fn root() -> Self {
        Self(ROOT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT
    }

    /// Non-empty segments in order; empty for the root.
    pub fn segments(&self) -> Vec<&str> {
        split_segments(&self.0)
    }

    /// Append a child name.
    pub fn join(&self, name: &str) -> Self {
        join(&self.0, name)
    }

    /// Last segment, or [`ROOT_NAME`] for the root.
    pub fn base_name(&self) -> &str {
        base_name(&self.0)
    }

    /// The enclosing directory. The root is its own parent.
    pub fn parent(&self) -> Self {
        parent(&self.0)
    }

    /// The form the remote API expects: the root is the empty string.
    pub fn api_path(&self) -> &str {
        if self.is_root() { "" } else { &self.0 }
    }

    /// Path of `self` below `base`, without a leading slash.
    ///
    /// Returns `Some("")` when the two are equal and `None` when `self` is
    /// not inside `base`.
    pub fn relative_to(&self, base: &VirtualPath) -> Option<&str> {
        relative_to(&self.0, &base.0)
    }

    /// True if `self` is `base` or lies below it.
    pub fn starts_with(&self, base: &VirtualPath) -> bool {
        self.relative_to(base).is_some()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for VirtualPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Debug for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VirtualPath({:?})", self.0)
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VirtualPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for VirtualPath {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for VirtualPath {
    fn from(s: &str) -> Self {
        normalize(s)
    }
}

impl From<String> for VirtualPath {
    fn from(s: String) -> Self {
        normalize(&s)
    }
}

impl From<VirtualPath> for String {
    fn from(p: VirtualPath) -> Self {
        p.0
    }
}

/// Normalize a raw path.
///
/// Empty input maps to `/`, a missing leading slash is added, and trailing
/// slashes beyond the root are stripped. Idempotent.
pub fn normalize(path: &str) -> VirtualPath {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        VirtualPath::root()
    } else if trimmed.starts_with('/') {
        VirtualPath(trimmed.to_string())
    } else {
        VirtualPath(format!("/{trimmed}"))
    }
}

/// Split a path into its non-empty segments. `/` yields nothing.
pub fn split_segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Join a directory and a child name.
///
/// `join("/", "x") == "/x"`, `join("/a", "b") == "/a/b"`.
pub fn join(dir: &str, name: &str) -> VirtualPath {
    let dir = normalize(dir);
    let name = name.trim_start_matches('/');
    if dir.is_root() {
        normalize(&format!("/{name}"))
    } else {
        normalize(&format!("{}/{name}", dir.0))
    }
}

/// Last segment of a path, or [`ROOT_NAME`] for the root.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/')
        .find(|s| !s.is_empty())
        .unwrap_or(ROOT_NAME)
}

/// Enclosing directory of a path. The root is its own parent.
pub fn parent(path: &str) -> VirtualPath {
    let path = normalize(path);
    match path.0.rfind('/') {
        Some(0) | None => VirtualPath::root(),
        Some(idx) => normalize(&path.0[..idx]),
    }
}

/// Path of `path` below `base`, both taken as normalized.
pub fn relative_to<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    if base == ROOT {
        return path.strip_prefix('/');
    }
    if path == base {
        return Some("");
    }
    path.strip_prefix(base)?.strip_prefix('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("").as_str(), "/");
        assert_eq!(normalize("/").as_str(), "/");
        assert_eq!(normalize("///").as_str(), "/");
        assert_eq!(normalize("data").as_str(), "/data");
        assert_eq!(normalize("/data/").as_str(), "/data");
        assert_eq!(normalize("/data/plugins//").as_str(), "/data/plugins");
        assert_eq!(normalize("/Data").as_str(), "/Data");
    }

    #[test]
    fn test_normalize_idempotent() {
        for raw in ["", "/", "a", "a/", "/a/b/", "//x//", "/a//b", "plugins/config.yml"] {
            let once = normalize(raw);
            let twice = normalize(once.as_str());
            assert_eq!(once, twice, "normalize not idempotent for {raw:?}");
        }
    }

    #[test]
    fn test_split_segments() {
        assert!(split_segments("/").is_empty());
        assert_eq!(split_segments("/data"), vec!["data"]);
        assert_eq!(split_segments("/data/world/region"), vec!["data", "world", "region"]);
        assert_eq!(split_segments("/a//b"), vec!["a", "b"]);
    }

    #[test]
    fn test_join() {
        assert_eq!(join("/", "x").as_str(), "/x");
        assert_eq!(join("/a", "b").as_str(), "/a/b");
        assert_eq!(join("/a/", "b").as_str(), "/a/b");
        assert_eq!(join("", "b").as_str(), "/b");
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("/"), ROOT_NAME);
        assert_eq!(base_name("/data"), "data");
        assert_eq!(base_name("/data/world/level.dat"), "level.dat");
        assert_eq!(base_name("/data/"), "data");
    }

    #[test]
    fn test_parent() {
        assert_eq!(parent("/").as_str(), "/");
        assert_eq!(parent("/data").as_str(), "/");
        assert_eq!(parent("/data/world").as_str(), "/data");
    }

    #[test]
    fn test_api_path() {
        assert_eq!(VirtualPath::root().api_path(), "");
        assert_eq!(VirtualPath::new("/data/").api_path(), "/data");
    }

    #[test]
    fn test_relative_to() {
        let base = VirtualPath::new("/data");
        assert_eq!(VirtualPath::new("/data/sub/b.txt").relative_to(&base), Some("sub/b.txt"));
        assert_eq!(VirtualPath::new("/data").relative_to(&base), Some(""));
        assert_eq!(VirtualPath::new("/database").relative_to(&base), None);
        assert_eq!(VirtualPath::new("/logs/x").relative_to(&base), None);
        assert_eq!(
            VirtualPath::new("/data/a.txt").relative_to(&VirtualPath::root()),
            Some("data/a.txt")
        );
    }

    #[test]
    fn test_serde_normalizes() {
        let path: VirtualPath = serde_json::from_str("\"config/\"").unwrap();
        assert_eq!(path.as_str(), "/config");
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"/config\"");
    }
}
