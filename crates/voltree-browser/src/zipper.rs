//! Recursive zip download.
//!
//! Walks a subtree depth-first through the same listing dispatch as the
//! cache (but not the cache itself, so the walk sees its own consistent
//! snapshot), reads every file one at a time, and delivers a single
//! archive. Reads are sequential to bound memory and request pressure on
//! the game server; all bytes are buffered before the archive is written.
//!
//! Any failure aborts the whole download. Nothing partial is delivered.

use std::io::{Cursor, Write};

use futures::future::BoxFuture;
use tracing::Instrument;
use voltree_types::path::normalize;
use voltree_types::{EntryKind, VirtualPath};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::DownloadError;
use crate::sink::DownloadSink;
use crate::source::ListingSource;

/// A file discovered by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipFile {
    /// Absolute virtual path, used for the read.
    pub path: VirtualPath,
    /// Name inside the archive, relative to the walk's start.
    pub archive_name: String,
}

/// Result of a completed download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZipSummary {
    /// Download name, `<base name>.zip`.
    pub file_name: String,
    /// Number of files in the archive.
    pub files: usize,
    /// Uncompressed bytes read from the remote.
    pub bytes: u64,
    /// Size of the finished archive.
    pub archive_size: u64,
}

/// Builds zip downloads of arbitrary subtrees.
#[derive(Debug, Clone)]
pub struct Zipper {
    source: ListingSource,
}

impl Zipper {
    pub fn new(source: ListingSource) -> Self {
        Self { source }
    }

    /// Download name for a start path.
    pub fn archive_name(start: &VirtualPath) -> String {
        format!("{}.zip", start.base_name())
    }

    /// Discover every file below `start`, in depth-first listing order.
    pub async fn collect_files(&self, start: &VirtualPath) -> Result<Vec<ZipFile>, DownloadError> {
        self.walk(start, start.clone()).await
    }

    fn walk<'a>(
        &'a self,
        start: &'a VirtualPath,
        dir: VirtualPath,
    ) -> BoxFuture<'a, Result<Vec<ZipFile>, DownloadError>> {
        Box::pin(async move {
            let span = tracing::debug_span!("zip.walk", path = %dir);
            let listing = self.source.list(&dir, 1).instrument(span).await?;

            let mut files = Vec::new();
            for entry in listing.into_entries() {
                let path = dir.join(&entry.name);
                match entry.kind {
                    EntryKind::File => {
                        let archive_name = match path.relative_to(start) {
                            Some(rel) if !rel.is_empty() => rel.to_string(),
                            _ => entry.name.clone(),
                        };
                        files.push(ZipFile { path, archive_name });
                    }
                    EntryKind::Directory => {
                        files.extend(self.walk(start, path).await?);
                    }
                }
            }
            Ok(files)
        })
    }

    /// Read every file and assemble the archive in memory.
    ///
    /// `on_progress(done, total)` runs after each file is read, with `total`
    /// fixed at the number of files the walk found.
    pub async fn build_archive<F>(
        &self,
        files: &[ZipFile],
        mut on_progress: F,
    ) -> Result<(Vec<u8>, u64), DownloadError>
    where
        F: FnMut(usize, usize) + Send,
    {
        let total = files.len();
        let mut contents = Vec::with_capacity(total);
        for (idx, file) in files.iter().enumerate() {
            let span = tracing::trace_span!("zip.read", path = %file.path);
            let bytes = self.source.read(&file.path).instrument(span).await?;
            contents.push(bytes);
            on_progress(idx + 1, total);
        }

        let read_bytes = contents.iter().map(|b| b.len() as u64).sum();
        let archive = write_archive(files, &contents)?;
        Ok((archive, read_bytes))
    }

    /// Zip everything below `start_path` and hand the archive to `sink`.
    pub async fn zip_and_download<F>(
        &self,
        start_path: &str,
        sink: &dyn DownloadSink,
        on_progress: F,
    ) -> Result<ZipSummary, DownloadError>
    where
        F: FnMut(usize, usize) + Send,
    {
        let start = normalize(start_path);
        let span = tracing::info_span!("zip.download", %start);
        self.download(start, sink, on_progress).instrument(span).await
    }

    async fn download<F>(
        &self,
        start: VirtualPath,
        sink: &dyn DownloadSink,
        on_progress: F,
    ) -> Result<ZipSummary, DownloadError>
    where
        F: FnMut(usize, usize) + Send,
    {
        let file_name = Self::archive_name(&start);

        let files = self.collect_files(&start).await.inspect_err(|e| {
            tracing::warn!(%start, error = %e, "zip walk failed");
        })?;
        tracing::debug!(%start, files = files.len(), "zip walk complete");

        let (archive, bytes) = self
            .build_archive(&files, on_progress)
            .await
            .inspect_err(|e| {
                tracing::warn!(%start, error = %e, "zip assembly failed");
            })?;

        let archive_size = archive.len() as u64;
        sink.deliver(&file_name, archive).await?;

        tracing::info!(%start, %file_name, files = files.len(), bytes, archive_size, "zip download delivered");
        Ok(ZipSummary {
            file_name,
            files: files.len(),
            bytes,
            archive_size,
        })
    }
}

/// Write the buffered files into a deflated zip archive.
fn write_archive(files: &[ZipFile], contents: &[Vec<u8>]) -> Result<Vec<u8>, DownloadError> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    for (file, bytes) in files.iter().zip(contents) {
        writer.start_file(file.archive_name.as_str(), options)?;
        writer.write_all(bytes)?;
    }

    Ok(writer.finish()?.into_inner())
}
