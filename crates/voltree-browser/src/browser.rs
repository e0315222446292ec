//! File browser session: navigation over the listing cache.
//!
//! A [`FileBrowser`] is opened when the user enters a server's file view and
//! closed when they leave it. It owns the listing cache and the current
//! path; nothing else writes to either.
//!
//! Every path change results in a cache hit or exactly one fetch attempt.
//! Writes go to the remote and are followed by a forced refresh of the
//! current directory, so the next render reflects server state.

use std::sync::Arc;

use tokio::sync::watch;
use voltree_types::path::normalize;
use voltree_types::{DirEntry, VirtualPath};

use crate::cache::{FetchOptions, FetchOutcome, ListingCache, ListingView};
use crate::config::BrowserConfig;
use crate::error::{BrowserError, DownloadError};
use crate::remote::RemoteFs;
use crate::sink::DownloadSink;
use crate::source::ListingSource;
use crate::zipper::{ZipSummary, Zipper};

/// One server's file browser session.
#[derive(Debug)]
pub struct FileBrowser {
    cache: ListingCache,
    current_path: watch::Sender<VirtualPath>,
    fetch_depth: u32,
}

impl FileBrowser {
    /// Open a session for the configured server.
    pub fn open(config: &BrowserConfig, remote: Arc<dyn RemoteFs>) -> Self {
        let source = ListingSource::from_mounts(&config.mounts, remote, config.server());
        tracing::info!(
            server = %config.server_id,
            mounts = config.mounts.len(),
            fetch_depth = config.fetch_depth,
            "file browser opened"
        );
        Self::new(source, config.fetch_depth)
    }

    pub fn new(source: ListingSource, fetch_depth: u32) -> Self {
        let (current_path, _) = watch::channel(VirtualPath::root());
        Self {
            cache: ListingCache::new(source),
            current_path,
            fetch_depth: fetch_depth.max(1),
        }
    }

    /// End the session, dropping every cached listing.
    pub fn close(self) {
        tracing::info!(
            server = %self.cache.source().server(),
            cached = self.cache.len(),
            "file browser closed"
        );
    }

    pub fn cache(&self) -> &ListingCache {
        &self.cache
    }

    pub fn source(&self) -> &ListingSource {
        self.cache.source()
    }

    pub fn fetch_depth(&self) -> u32 {
        self.fetch_depth
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn current_path(&self) -> VirtualPath {
        self.current_path.borrow().clone()
    }

    /// Navigate to `path` and make sure its listing is displayed.
    pub async fn set_current_path(&self, path: &str) -> FetchOutcome {
        let path = normalize(path);
        self.current_path.send_replace(path.clone());
        self.cache
            .ensure_fetched(path.as_str(), self.fetch_depth, FetchOptions::default())
            .await
    }

    /// Navigate to the enclosing directory.
    pub async fn go_up(&self) -> FetchOutcome {
        let up = self.current_path().parent();
        self.set_current_path(up.as_str()).await
    }

    /// Open a child of the current directory.
    pub async fn enter(&self, name: &str) -> FetchOutcome {
        let child = self.current_path().join(name);
        self.set_current_path(child.as_str()).await
    }

    /// Re-list the current directory, bypassing the cache.
    pub async fn refresh(&self) -> FetchOutcome {
        let path = self.current_path();
        self.cache
            .ensure_fetched(path.as_str(), self.fetch_depth, FetchOptions::forced())
            .await
    }

    /// Populate the cache for any path. Does not move the current path.
    pub async fn ensure_fetched(&self, path: &str, depth: u32, opts: FetchOptions) -> FetchOutcome {
        self.cache.ensure_fetched(path, depth, opts).await
    }

    // ========================================================================
    // Observable state
    // ========================================================================

    pub fn objects(&self) -> Vec<DirEntry> {
        self.cache.objects()
    }

    pub fn loading(&self) -> bool {
        self.cache.loading()
    }

    pub fn error(&self) -> Option<String> {
        self.cache.error()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListingView> {
        self.cache.subscribe()
    }

    pub fn subscribe_path(&self) -> watch::Receiver<VirtualPath> {
        self.current_path.subscribe()
    }

    // ========================================================================
    // Writes
    // ========================================================================

    pub async fn create_directory(&self, path: &str) -> Result<(), BrowserError> {
        let path = self.writable(path)?;
        let source = self.source();
        source
            .remote()
            .create_directory(source.server(), path.api_path())
            .await?;
        self.after_write(&[path.parent()], None).await;
        Ok(())
    }

    pub async fn rename(&self, from: &str, to: &str) -> Result<(), BrowserError> {
        let from = self.writable(from)?;
        let to = self.writable(to)?;
        let source = self.source();
        source
            .remote()
            .rename(source.server(), from.api_path(), to.api_path())
            .await?;
        self.after_write(&[from.parent(), to.parent()], Some(&from))
            .await;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), BrowserError> {
        let path = self.writable(path)?;
        let source = self.source();
        source.remote().delete(source.server(), path.api_path()).await?;
        self.after_write(&[path.parent()], Some(&path)).await;
        Ok(())
    }

    pub async fn upload(&self, path: &str, data: &[u8]) -> Result<(), BrowserError> {
        let path = self.writable(path)?;
        let source = self.source();
        source
            .remote()
            .upload(source.server(), path.api_path(), data)
            .await?;
        self.after_write(&[path.parent()], None).await;
        Ok(())
    }

    fn writable(&self, path: &str) -> Result<VirtualPath, BrowserError> {
        let path = normalize(path);
        if self.source().is_writable(&path) {
            Ok(path)
        } else {
            Err(BrowserError::NotWritable(path.into_string()))
        }
    }

    /// Drop listings a write may have changed, then re-list what is shown.
    ///
    /// `touched` directories lose their own entry. A `removed` path loses
    /// its entry and every entry below it.
    async fn after_write(&self, touched: &[VirtualPath], removed: Option<&VirtualPath>) {
        for path in touched {
            self.cache.invalidate(path.as_str());
        }
        if let Some(path) = removed {
            self.cache.invalidate_subtree(path.as_str());
        }
        self.refresh().await;
    }

    // ========================================================================
    // Downloads
    // ========================================================================

    pub fn zipper(&self) -> Zipper {
        Zipper::new(self.source().clone())
    }

    /// Zip `start_path` and everything below it into `sink`.
    pub async fn zip_and_download<F>(
        &self,
        start_path: &str,
        sink: &dyn DownloadSink,
        on_progress: F,
    ) -> Result<ZipSummary, DownloadError>
    where
        F: FnMut(usize, usize) + Send,
    {
        self.zipper()
            .zip_and_download(start_path, sink, on_progress)
            .await
    }
}
