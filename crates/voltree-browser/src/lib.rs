//! # voltree-browser
//!
//! Core of a game server's file browser: one navigable tree over the
//! server's independent volume mounts.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              FileBrowser                 │
//! │   current path · writes · downloads      │
//! └───────────┬───────────────────┬──────────┘
//!             │                   │
//!             ▼                   ▼
//! ┌──────────────────┐  ┌──────────────────┐
//! │  ListingCache    │  │  Zipper          │
//! │  (path → depth)  │  │  (walk + zip)    │
//! └────────┬─────────┘  └────────┬─────────┘
//!          │                     │
//!          ▼                     ▼
//! ┌──────────────────────────────────────────┐
//! │  ListingSource: MountTrie | RemoteFs     │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Synthetic directories (ancestors of mount roots) are listed from the
//! [`MountTrie`]; mount roots and everything below them go to [`RemoteFs`].

pub mod browser;
pub mod cache;
pub mod config;
pub mod error;
pub mod remote;
pub mod sink;
pub mod source;
pub mod trie;
pub mod zipper;

pub use browser::FileBrowser;
pub use cache::{
    CacheEntry, FetchOptions, FetchOutcome, LIST_FAILED_MESSAGE, ListingCache, ListingView,
};
pub use config::{BrowserConfig, ConfigError, DEFAULT_FETCH_DEPTH};
pub use error::{BrowserError, DownloadError};
pub use remote::{LocalRemote, MemoryRemote, RemoteError, RemoteFs, RemoteResult};
pub use sink::{DirectorySink, DownloadSink, MemorySink};
pub use source::{Listing, ListingSource};
pub use trie::{Classification, MountTrie, TrieNode};
pub use zipper::{ZipFile, ZipSummary, Zipper};

pub use voltree_types::{DirEntry, EntryKind, ServerId, VirtualPath, VolumeMount};
