//! Path-keyed listing cache with fetch-depth semantics.
//!
//! An entry fetched at depth `d` answers any request needing depth ≤ `d`.
//! Synthetic listings are stored at depth 0, so they are recomputed from the
//! trie on every normal navigation and never sent to the remote.
//!
//! Entries are only replaced by a forced refresh (after a write) or by a
//! request for more depth than cached. There is no TTL and no background
//! revalidation. Concurrent fetches of the same path are not merged; the
//! last one to finish wins.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::Instrument;
use voltree_types::path::normalize;
use voltree_types::{DirEntry, VirtualPath};

use crate::source::ListingSource;

/// Message shown when a remote listing fails. Details go to the log.
pub const LIST_FAILED_MESSAGE: &str = "Failed to load directory";

/// A cached listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub fetch_depth: u32,
    pub objects: Vec<DirEntry>,
}

/// Observable listing state for the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingView {
    /// The path most recently requested; `objects` belong to it once
    /// loading finishes.
    pub path: VirtualPath,
    /// Entries currently displayed.
    pub objects: Vec<DirEntry>,
    /// A remote listing is in flight.
    pub loading: bool,
    /// Last listing failure for `path`, if any.
    pub error: Option<String>,
}

/// Options for [`ListingCache::ensure_fetched`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Ignore any cached entry and list again.
    pub force: bool,
}

impl FetchOptions {
    pub fn forced() -> Self {
        Self { force: true }
    }
}

/// What [`ListingCache::ensure_fetched`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Served from the cache, no network.
    CacheHit,
    /// Answered by the mount trie, no network.
    Synthetic,
    /// Listed by the remote API and cached.
    Fetched,
    /// The remote listing failed; the error is in the view.
    Failed,
}

/// Listing cache for one browser session.
pub struct ListingCache {
    source: ListingSource,
    entries: RwLock<HashMap<VirtualPath, CacheEntry>>,
    view: watch::Sender<ListingView>,
    in_flight: AtomicUsize,
}

impl std::fmt::Debug for ListingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListingCache")
            .field("source", &self.source)
            .field("entries", &self.entries.read().len())
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .finish()
    }
}

impl ListingCache {
    pub fn new(source: ListingSource) -> Self {
        let (view, _) = watch::channel(ListingView::default());
        Self {
            source,
            entries: RwLock::new(HashMap::new()),
            view,
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn source(&self) -> &ListingSource {
        &self.source
    }

    /// Make sure `path` is listed to at least `depth` and display it.
    ///
    /// Failures are absorbed: the view keeps its previous objects and
    /// carries [`LIST_FAILED_MESSAGE`]. Loading is always cleared once the
    /// last in-flight fetch settles.
    pub async fn ensure_fetched(&self, path: &str, depth: u32, opts: FetchOptions) -> FetchOutcome {
        let path = normalize(path);
        self.view.send_modify(|v| v.path = path.clone());

        if !opts.force {
            let hit = self
                .entries
                .read()
                .get(&path)
                .filter(|e| e.fetch_depth >= depth)
                .map(|e| e.objects.clone());
            if let Some(objects) = hit {
                tracing::debug!(%path, depth, "listing cache hit");
                self.view.send_modify(|v| {
                    v.objects = objects;
                    v.error = None;
                });
                return FetchOutcome::CacheHit;
            }
        }

        if let Some(entries) = self.source.classify(&path).into_local_listing() {
            tracing::debug!(%path, count = entries.len(), "synthetic listing");
            self.store(&path, 0, entries.clone());
            self.view.send_modify(|v| {
                v.objects = entries;
                v.error = None;
                v.loading = self.in_flight.load(Ordering::SeqCst) > 0;
            });
            return FetchOutcome::Synthetic;
        }

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.view.send_modify(|v| {
            v.loading = true;
            v.error = None;
        });

        let span = tracing::debug_span!("listing.fetch", %path, depth);
        let result = self.source.fetch_remote(&path, depth).instrument(span).await;
        let still_loading = self.in_flight.fetch_sub(1, Ordering::SeqCst) > 1;

        match result {
            Ok(entries) => {
                tracing::debug!(%path, depth, count = entries.len(), "listing fetched");
                self.store(&path, depth, entries.clone());
                self.view.send_modify(|v| {
                    if v.path == path {
                        v.objects = entries;
                    }
                    v.loading = still_loading;
                });
                FetchOutcome::Fetched
            }
            Err(e) => {
                tracing::warn!(%path, depth, error = %e, "directory listing failed");
                self.view.send_modify(|v| {
                    if v.path == path {
                        v.error = Some(LIST_FAILED_MESSAGE.to_string());
                    }
                    v.loading = still_loading;
                });
                FetchOutcome::Failed
            }
        }
    }

    fn store(&self, path: &VirtualPath, fetch_depth: u32, objects: Vec<DirEntry>) {
        self.entries.write().insert(
            path.clone(),
            CacheEntry {
                fetch_depth,
                objects,
            },
        );
    }

    /// Drop the entry for `path`, if any.
    pub fn invalidate(&self, path: &str) -> bool {
        self.entries.write().remove(&normalize(path)).is_some()
    }

    /// Drop the entry for `path` and every entry below it. Returns how many
    /// were dropped.
    pub fn invalidate_subtree(&self, path: &str) -> usize {
        let base = normalize(path);
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|cached, _| !cached.starts_with(&base));
        before - entries.len()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn cached(&self, path: &str) -> Option<CacheEntry> {
        self.entries.read().get(&normalize(path)).cloned()
    }

    pub fn cached_depth(&self, path: &str) -> Option<u32> {
        self.entries.read().get(&normalize(path)).map(|e| e.fetch_depth)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of the current view.
    pub fn view(&self) -> ListingView {
        self.view.borrow().clone()
    }

    /// Watch the view for changes.
    pub fn subscribe(&self) -> watch::Receiver<ListingView> {
        self.view.subscribe()
    }

    pub fn objects(&self) -> Vec<DirEntry> {
        self.view.borrow().objects.clone()
    }

    pub fn loading(&self) -> bool {
        self.view.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.view.borrow().error.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use voltree_types::ServerId;

    use super::*;
    use crate::remote::MemoryRemote;
    use crate::trie::MountTrie;

    fn setup(mounts: &[&str], remote: MemoryRemote) -> (ListingCache, Arc<MemoryRemote>) {
        let remote = Arc::new(remote);
        let source = ListingSource::new(
            MountTrie::from_paths(mounts.iter().copied()),
            remote.clone(),
            ServerId::new("srv"),
        );
        (ListingCache::new(source), remote)
    }

    fn names(entries: &[DirEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[tokio::test]
    async fn test_cache_hit_skips_remote() {
        let (cache, remote) = setup(&["/data"], MemoryRemote::new().with_file("/data/a.txt", "a"));

        let outcome = cache.ensure_fetched("/data", 1, FetchOptions::default()).await;
        assert_eq!(outcome, FetchOutcome::Fetched);
        assert_eq!(names(&cache.objects()), vec!["a.txt"]);

        let outcome = cache.ensure_fetched("/data/", 1, FetchOptions::default()).await;
        assert_eq!(outcome, FetchOutcome::CacheHit);
        assert_eq!(remote.list_calls("/data"), 1);
    }

    #[tokio::test]
    async fn test_deeper_request_refetches() {
        let (cache, remote) = setup(&["/data"], MemoryRemote::new().with_file("/data/sub/b.txt", "b"));

        cache.ensure_fetched("/data", 1, FetchOptions::default()).await;
        let outcome = cache.ensure_fetched("/data", 2, FetchOptions::default()).await;
        assert_eq!(outcome, FetchOutcome::Fetched);
        assert_eq!(remote.list_calls("/data"), 2);
        assert_eq!(cache.cached_depth("/data"), Some(2));

        // A depth-2 entry also serves depth-1 requests
        let outcome = cache.ensure_fetched("/data", 1, FetchOptions::default()).await;
        assert_eq!(outcome, FetchOutcome::CacheHit);
        assert_eq!(remote.list_calls("/data"), 2);
    }

    #[tokio::test]
    async fn test_forced_refresh() {
        let (cache, remote) = setup(&["/data"], MemoryRemote::new().with_file("/data/a.txt", "a"));

        cache.ensure_fetched("/data", 1, FetchOptions::default()).await;
        remote.insert_file("/data/b.txt", "b");
        cache.ensure_fetched("/data", 1, FetchOptions::default()).await;
        assert_eq!(names(&cache.objects()), vec!["a.txt"]);

        let outcome = cache.ensure_fetched("/data", 1, FetchOptions::forced()).await;
        assert_eq!(outcome, FetchOutcome::Fetched);
        assert_eq!(names(&cache.objects()), vec!["a.txt", "b.txt"]);
        assert_eq!(remote.list_calls("/data"), 2);
    }

    #[tokio::test]
    async fn test_synthetic_listing() {
        let (cache, remote) = setup(&["/data", "/config"], MemoryRemote::new());

        let outcome = cache.ensure_fetched("/", 1, FetchOptions::default()).await;
        assert_eq!(outcome, FetchOutcome::Synthetic);
        assert_eq!(names(&cache.objects()), vec!["config", "data"]);
        assert_eq!(cache.cached_depth("/"), Some(0));
        assert!(!cache.loading());
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_path_is_empty() {
        let (cache, remote) = setup(&["/data"], MemoryRemote::new().with_dir("/data"));

        cache.ensure_fetched("/data", 1, FetchOptions::default()).await;
        let outcome = cache
            .ensure_fetched("/nonexistent-waypoint", 1, FetchOptions::default())
            .await;
        assert_eq!(outcome, FetchOutcome::Synthetic);
        assert!(cache.objects().is_empty());
        assert!(cache.error().is_none());
        assert_eq!(remote.list_calls("/nonexistent-waypoint"), 0);
    }

    #[tokio::test]
    async fn test_failure_keeps_objects() {
        let (cache, remote) = setup(
            &["/data", "/logs"],
            MemoryRemote::new().with_file("/data/a.txt", "a").with_dir("/logs"),
        );
        remote.fail_listings_of("/logs");

        cache.ensure_fetched("/data", 1, FetchOptions::default()).await;
        let outcome = cache.ensure_fetched("/logs", 1, FetchOptions::default()).await;
        assert_eq!(outcome, FetchOutcome::Failed);

        let view = cache.view();
        assert_eq!(names(&view.objects), vec!["a.txt"]);
        assert_eq!(view.error.as_deref(), Some(LIST_FAILED_MESSAGE));
        assert!(!view.loading);
        assert!(cache.cached("/logs").is_none());
    }

    #[tokio::test]
    async fn test_success_clears_previous_error() {
        let (cache, remote) = setup(&["/logs"], MemoryRemote::new().with_dir("/logs"));
        remote.fail_listings_of("/logs");
        cache.ensure_fetched("/logs", 1, FetchOptions::default()).await;
        assert!(cache.error().is_some());

        remote.clear_faults();
        cache.ensure_fetched("/logs", 1, FetchOptions::default()).await;
        assert!(cache.error().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let (cache, _remote) = setup(&["/data"], MemoryRemote::new().with_file("/data/a.txt", "a"));
        let mut rx = cache.subscribe();

        cache.ensure_fetched("/data", 1, FetchOptions::default()).await;
        assert!(rx.has_changed().unwrap());
        let view = rx.borrow_and_update().clone();
        assert_eq!(view.path.as_str(), "/data");
        assert_eq!(names(&view.objects), vec!["a.txt"]);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let (cache, remote) = setup(&["/data"], MemoryRemote::new().with_dir("/data"));

        cache.ensure_fetched("/data", 1, FetchOptions::default()).await;
        assert!(cache.invalidate("/data"));
        assert!(!cache.invalidate("/data"));
        cache.ensure_fetched("/data", 1, FetchOptions::default()).await;
        assert_eq!(remote.list_calls("/data"), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_subtree() {
        let (cache, _remote) = setup(
            &["/data"],
            MemoryRemote::new()
                .with_file("/data/world/region/r.mca", "r")
                .with_dir("/data/worlds"),
        );
        for path in ["/data", "/data/world", "/data/world/region", "/data/worlds"] {
            cache.ensure_fetched(path, 1, FetchOptions::default()).await;
        }

        assert_eq!(cache.invalidate_subtree("/data/world/"), 2);
        assert!(cache.cached("/data").is_some());
        assert!(cache.cached("/data/worlds").is_some());
        assert!(cache.cached("/data/world/region").is_none());
    }
}
