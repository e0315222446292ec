//! Host-directory remote file API.
//!
//! Serves each volume mount from its `host_path`, the way the game server
//! agent does on the host. Requests are routed by longest container-path
//! prefix, and resolved paths may not escape the volume's directory.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tokio::fs;
use voltree_types::path::normalize;
use voltree_types::{DirEntry, EntryKind, ServerId, VirtualPath, VolumeMount};

use crate::remote::{RemoteError, RemoteFs, RemoteResult};

/// A volume resolved to a canonical host directory.
#[derive(Debug, Clone)]
struct HostVolume {
    container_path: VirtualPath,
    root: PathBuf,
    read_only: bool,
}

/// Remote file API backed by host directories.
///
/// For a mount `/data -> /srv/mc/data`, `read_file("/data/server.properties")`
/// reads `/srv/mc/data/server.properties`. Nested mounts route to the most
/// specific one. Paths outside every mount fail with
/// [`RemoteError::NoMountPoint`].
#[derive(Debug, Clone)]
pub struct LocalRemote {
    volumes: Vec<HostVolume>,
}

impl LocalRemote {
    /// Build from the server's volume mounts.
    ///
    /// Host directories are canonicalized up front to handle symlinked
    /// roots (e.g. macOS `/tmp` → `/private/tmp`).
    pub fn new(mounts: &[VolumeMount]) -> Self {
        let volumes = mounts
            .iter()
            .map(|m| HostVolume {
                container_path: m.virtual_path(),
                root: dunce::canonicalize(&m.host_path).unwrap_or_else(|_| m.host_path.clone()),
                read_only: m.read_only,
            })
            .collect();
        Self { volumes }
    }

    /// Find the volume for a path and the part of the path below it.
    fn route(&self, path: &str) -> RemoteResult<(&HostVolume, String)> {
        let path = normalize(path);

        // Find longest matching mount point
        let best = self
            .volumes
            .iter()
            .filter_map(|v| path.relative_to(&v.container_path).map(|rel| (v, rel)))
            .max_by_key(|(v, _)| v.container_path.as_str().len());

        match best {
            Some((volume, relative)) => Ok((volume, relative.to_string())),
            None => Err(RemoteError::no_mount_point(path.as_str())),
        }
    }

    /// Resolve a virtual path to a host path inside its volume.
    ///
    /// Returns an error if the path escapes the volume (via `..` or a
    /// symlink pointing outside).
    fn resolve(&self, path: &str) -> RemoteResult<(&HostVolume, PathBuf)> {
        let (volume, relative) = self.route(path)?;
        if relative.is_empty() {
            return Ok((volume, volume.root.clone()));
        }

        let full = volume.root.join(&relative);

        // For new files, canonicalize the parent and append the filename
        let canonical = if full.exists() {
            dunce::canonicalize(&full).map_err(|e| RemoteError::from_io(e, path))?
        } else {
            let parent = full
                .parent()
                .ok_or_else(|| RemoteError::invalid_path(path))?;
            let filename = full
                .file_name()
                .ok_or_else(|| RemoteError::invalid_path(path))?;
            if parent.exists() {
                dunce::canonicalize(parent)
                    .map_err(|e| RemoteError::from_io(e, path))?
                    .join(filename)
            } else {
                full.clone()
            }
        };

        if !canonical.starts_with(&volume.root) {
            return Err(RemoteError::path_escapes_root(format!(
                "{} is not under {}",
                canonical.display(),
                volume.root.display()
            )));
        }

        Ok((volume, canonical))
    }

    fn check_writable(volume: &HostVolume, path: &str) -> RemoteResult<()> {
        if volume.read_only {
            Err(RemoteError::read_only(path))
        } else {
            Ok(())
        }
    }

    fn metadata_to_entry(name: String, meta: &std::fs::Metadata) -> DirEntry {
        let kind = if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };
        let mut entry = DirEntry::new(name, kind);
        if kind.is_file() {
            entry.size = Some(meta.len());
        }
        entry.permissions = permission_bits(meta);
        entry.modified = Some(meta.modified().unwrap_or(SystemTime::UNIX_EPOCH));
        entry
    }

    /// Read a host directory, descending `depth - 1` more levels.
    fn read_dir_depth<'a>(
        dir: &'a Path,
        virtual_dir: &'a str,
        depth: u32,
    ) -> BoxFuture<'a, RemoteResult<Vec<DirEntry>>> {
        Box::pin(async move {
            let mut reader = fs::read_dir(dir)
                .await
                .map_err(|e| RemoteError::from_io(e, virtual_dir))?;

            let mut entries = Vec::new();
            while let Some(item) = reader
                .next_entry()
                .await
                .map_err(|e| RemoteError::from_io(e, virtual_dir))?
            {
                let name = item.file_name().to_string_lossy().into_owned();
                let Ok(link_meta) = fs::symlink_metadata(item.path()).await else {
                    tracing::debug!(path = %item.path().display(), "skipping unreadable entry");
                    continue;
                };
                // Follow file symlinks only; directory links may point upward
                let meta = if link_meta.file_type().is_symlink() {
                    match fs::metadata(item.path()).await {
                        Ok(target) if target.is_dir() => {
                            tracing::debug!(path = %item.path().display(), "skipping symlinked directory");
                            continue;
                        }
                        Ok(target) => target,
                        Err(_) => {
                            tracing::debug!(path = %item.path().display(), "skipping dangling symlink");
                            continue;
                        }
                    }
                } else {
                    link_meta
                };
                let mut entry = Self::metadata_to_entry(name, &meta);
                if entry.is_dir() && depth > 1 {
                    let child_virtual = format!("{virtual_dir}/{}", entry.name);
                    let children =
                        Self::read_dir_depth(&item.path(), &child_virtual, depth - 1).await?;
                    entry.children = Some(children);
                }
                entries.push(entry);
            }

            // Sort for consistent ordering
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(entries)
        })
    }
}

#[cfg(unix)]
fn permission_bits(meta: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(meta.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn permission_bits(_meta: &std::fs::Metadata) -> Option<u32> {
    None
}

#[async_trait]
impl RemoteFs for LocalRemote {
    async fn list_directory(
        &self,
        _server: &ServerId,
        path: &str,
        fetch_depth: u32,
    ) -> RemoteResult<Vec<DirEntry>> {
        let (_, host) = self.resolve(path)?;
        let meta = fs::metadata(&host)
            .await
            .map_err(|e| RemoteError::from_io(e, path))?;
        if !meta.is_dir() {
            return Err(RemoteError::not_a_directory(path));
        }
        let virtual_dir = normalize(path);
        Self::read_dir_depth(&host, virtual_dir.as_str(), fetch_depth.max(1)).await
    }

    async fn read_file(&self, _server: &ServerId, path: &str) -> RemoteResult<Vec<u8>> {
        let (_, host) = self.resolve(path)?;
        let meta = fs::metadata(&host)
            .await
            .map_err(|e| RemoteError::from_io(e, path))?;
        if meta.is_dir() {
            return Err(RemoteError::is_a_directory(path));
        }
        fs::read(&host).await.map_err(|e| RemoteError::from_io(e, path))
    }

    async fn create_directory(&self, _server: &ServerId, path: &str) -> RemoteResult<()> {
        let (volume, host) = self.resolve(path)?;
        Self::check_writable(volume, path)?;
        fs::create_dir(&host)
            .await
            .map_err(|e| RemoteError::from_io(e, path))
    }

    async fn rename(&self, _server: &ServerId, from: &str, to: &str) -> RemoteResult<()> {
        let (from_volume, from_host) = self.resolve(from)?;
        let (to_volume, to_host) = self.resolve(to)?;

        if from_volume.container_path != to_volume.container_path {
            return Err(RemoteError::CrossVolume(from.to_string(), to.to_string()));
        }
        if from_host == from_volume.root {
            return Err(RemoteError::invalid_path(format!("cannot rename volume root {from}")));
        }
        Self::check_writable(from_volume, from)?;
        if fs::try_exists(&to_host).await.unwrap_or(false) {
            return Err(RemoteError::already_exists(to));
        }

        fs::rename(&from_host, &to_host)
            .await
            .map_err(|e| RemoteError::from_io(e, from))
    }

    async fn delete(&self, _server: &ServerId, path: &str) -> RemoteResult<()> {
        let (volume, host) = self.resolve(path)?;
        if host == volume.root {
            return Err(RemoteError::invalid_path(format!("cannot delete volume root {path}")));
        }
        Self::check_writable(volume, path)?;

        let meta = fs::symlink_metadata(&host)
            .await
            .map_err(|e| RemoteError::from_io(e, path))?;
        let result = if meta.is_dir() {
            fs::remove_dir_all(&host).await
        } else {
            fs::remove_file(&host).await
        };
        result.map_err(|e| RemoteError::from_io(e, path))
    }

    async fn upload(&self, _server: &ServerId, path: &str, data: &[u8]) -> RemoteResult<()> {
        let (volume, host) = self.resolve(path)?;
        Self::check_writable(volume, path)?;
        if host == volume.root {
            return Err(RemoteError::is_a_directory(path));
        }
        fs::write(&host, data)
            .await
            .map_err(|e| RemoteError::from_io(e, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn server() -> ServerId {
        ServerId::new("local")
    }

    fn setup() -> (LocalRemote, TempDir) {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        let config = dir.path().join("config");
        std::fs::create_dir_all(data.join("world")).unwrap();
        std::fs::create_dir_all(&config).unwrap();
        std::fs::write(data.join("server.properties"), "motd=hi").unwrap();
        std::fs::write(data.join("world/level.dat"), "lvl").unwrap();
        std::fs::write(config.join("ops.json"), "[]").unwrap();

        let remote = LocalRemote::new(&[
            VolumeMount::new("/data", &data),
            VolumeMount::new("/etc/game/config", &config).read_only(),
        ]);
        (remote, dir)
    }

    #[tokio::test]
    async fn test_list_routes_by_mount() {
        let (remote, _dir) = setup();

        let entries = remote.list_directory(&server(), "/data", 1).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["server.properties", "world"]);
        assert_eq!(entries[0].size, Some(7));
        assert!(entries[1].children.is_none());

        let entries = remote
            .list_directory(&server(), "/etc/game/config", 1)
            .await
            .unwrap();
        assert_eq!(entries[0].name, "ops.json");
    }

    #[tokio::test]
    async fn test_list_with_depth() {
        let (remote, _dir) = setup();
        let entries = remote.list_directory(&server(), "/data", 2).await.unwrap();
        let world = entries.iter().find(|e| e.name == "world").unwrap();
        let children = world.children.as_ref().unwrap();
        assert_eq!(children[0].name, "level.dat");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_directory_symlinks_hidden() {
        let (remote, dir) = setup();
        let data = dir.path().join("data");
        std::os::unix::fs::symlink(&data, data.join("loop")).unwrap();
        std::os::unix::fs::symlink(data.join("server.properties"), data.join("props")).unwrap();

        let entries = remote.list_directory(&server(), "/data", 4).await.unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["props", "server.properties", "world"]);

        let props = &entries[0];
        assert!(props.is_file());
        assert_eq!(props.size, Some(7));
    }

    #[tokio::test]
    async fn test_read_file() {
        let (remote, _dir) = setup();
        let bytes = remote
            .read_file(&server(), "/data/world/level.dat")
            .await
            .unwrap();
        assert_eq!(bytes, b"lvl");
        assert!(matches!(
            remote.read_file(&server(), "/data/world").await,
            Err(RemoteError::IsADirectory(_))
        ));
    }

    #[tokio::test]
    async fn test_outside_mounts() {
        let (remote, _dir) = setup();
        assert!(matches!(
            remote.list_directory(&server(), "/etc", 1).await,
            Err(RemoteError::NoMountPoint(_))
        ));
        assert!(matches!(
            remote.list_directory(&server(), "", 1).await,
            Err(RemoteError::NoMountPoint(_))
        ));
    }

    #[tokio::test]
    async fn test_escape_blocked() {
        let (remote, _dir) = setup();
        let result = remote.read_file(&server(), "/data/../config/ops.json").await;
        assert!(matches!(result, Err(RemoteError::PathEscapesRoot(_))));
    }

    #[tokio::test]
    async fn test_mutations() {
        let (remote, dir) = setup();
        let data = dir.path().join("data");

        remote.create_directory(&server(), "/data/backups").await.unwrap();
        assert!(data.join("backups").is_dir());

        remote
            .upload(&server(), "/data/backups/notes.txt", b"keep")
            .await
            .unwrap();
        remote
            .rename(&server(), "/data/backups", "/data/archive")
            .await
            .unwrap();
        assert_eq!(
            std::fs::read(data.join("archive/notes.txt")).unwrap(),
            b"keep"
        );

        remote.delete(&server(), "/data/archive").await.unwrap();
        assert!(!data.join("archive").exists());
        assert!(remote.delete(&server(), "/data").await.is_err());
    }

    #[tokio::test]
    async fn test_read_only_volume() {
        let (remote, _dir) = setup();
        let result = remote
            .upload(&server(), "/etc/game/config/ops.json", b"[\"amy\"]")
            .await;
        assert!(matches!(result, Err(RemoteError::ReadOnly(_))));
    }

    #[tokio::test]
    async fn test_cross_volume_rename_fails() {
        let (remote, _dir) = setup();
        let result = remote
            .rename(&server(), "/data/server.properties", "/etc/game/config/server.properties")
            .await;
        assert!(matches!(result, Err(RemoteError::CrossVolume(_, _))));
    }
}
