//! Duplicate finder: collection, size grouping and content hashing.
//!
//! # Overview
//!
//! [`DuplicateFinder::find_duplicates`] runs the detection pipeline over a
//! list of candidates produced elsewhere (usually the walker):
//!
//! 1. **Collection** - drop entries below the size threshold and, when
//!    archive support is on, expand every `.zip` candidate into its
//!    interior entries (progress `0.0 ..= 0.5`)
//! 2. **Size grouping** - discard sizes seen only once
//! 3. **Hashing** - BLAKE3 every remaining entry, one size group at a time
//!    (progress `0.5 ..= 1.0`)
//! 4. **Hash grouping** - keep buckets of two or more identical entries
//!
//! # Example
//!
//! ```no_run
//! use arcdupe::duplicates::{DuplicateFinder, FinderConfig};
//! use arcdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let files: Vec<_> = Walker::new(Path::new("."), WalkerConfig::default())
//!     .walk()
//!     .filter_map(Result::ok)
//!     .collect();
//!
//! let finder = DuplicateFinder::new(FinderConfig::default());
//! let (groups, summary) = finder.find_duplicates(files, false).unwrap();
//! println!("{} groups, {} reclaimable", groups.len(), summary.reclaimable_display());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;

use super::groups::{group_by_hash, group_by_size, DuplicateGroup, SizeGroup};
use crate::archive::{is_zip_path, ArchiveError, ArchiveReader};
use crate::progress::{ProgressCallback, ProgressTracker};
use crate::scanner::{ContentProvider, FileEntry, Hash, HashError, Hasher};

/// Default minimum entry size considered for deduplication (1 KiB).
pub const DEFAULT_MIN_SIZE: u64 = 1024;

/// Default number of hashing threads.
pub const DEFAULT_IO_THREADS: usize = 4;

/// Share of the progress range spent collecting candidates.
const COLLECTION_SHARE: f64 = 0.5;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Entries smaller than this are ignored.
    pub min_size: u64,
    /// Number of I/O threads for hashing within a size group.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Read chunk size used while hashing.
    pub chunk_size: usize,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("min_size", &self.min_size)
            .field("io_threads", &self.io_threads)
            .field("chunk_size", &self.chunk_size)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            io_threads: DEFAULT_IO_THREADS,
            chunk_size: crate::scanner::CHUNK_SIZE,
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the minimum entry size.
    #[must_use]
    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    /// Set the number of hashing threads.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the hashing read chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// Summary statistics from a duplicate scan.
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Number of candidates passed in
    pub total_candidates: usize,
    /// Number of `.zip` candidates expanded
    pub archives_expanded: usize,
    /// Number of entries read out of archives
    pub archive_entries: usize,
    /// Archives that could not be enumerated
    pub archive_errors: Vec<ArchiveError>,
    /// Pre-built archive entries dropped because archive support was off
    pub skipped_archive_entries: usize,
    /// Entries dropped for being empty or below the minimum size
    pub eliminated_by_min_size: usize,
    /// Entries dropped because no other entry had their size
    pub eliminated_by_size: usize,
    /// Number of entries hashed
    pub hashed_entries: usize,
    /// Entries that could not be hashed
    pub hash_errors: Vec<HashError>,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate entries (excluding one keeper per group)
    pub duplicate_files: usize,
    /// Total space that can be reclaimed by removing duplicates
    pub reclaimable_space: u64,
    /// Duration of the entire scan
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Format reclaimable space as human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Whether any per-item failure was recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.hash_errors.is_empty() || !self.archive_errors.is_empty()
    }
}

/// Errors that can occur during duplicate finding.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// Archive expansion was requested but no archive reader is configured.
    #[error("Archive scanning requested but no archive reader is configured")]
    ArchiveSupportUnavailable,
}

/// Duplicate finder that runs the detection pipeline.
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
    archive_reader: Option<Arc<dyn ArchiveReader>>,
}

impl std::fmt::Debug for DuplicateFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateFinder")
            .field("config", &self.config)
            .field(
                "archive_reader",
                &self.archive_reader.as_ref().map(|_| "<reader>"),
            )
            .finish()
    }
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        let hasher = Hasher::new().with_chunk_size(config.chunk_size);
        Self {
            config,
            hasher,
            archive_reader: None,
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Attach the reader used to expand `.zip` candidates.
    #[must_use]
    pub fn with_archive_reader(mut self, reader: Arc<dyn ArchiveReader>) -> Self {
        self.archive_reader = Some(reader);
        self
    }

    /// Find every set of byte-identical entries among `candidates`.
    ///
    /// With `include_archives`, plain `.zip` candidates are also expanded
    /// into their interior entries, which inherit the archive's timestamps.
    /// Pre-built archive-interior candidates are only considered when
    /// `include_archives` is set.
    ///
    /// Groups come back sorted by size descending, ties broken by hash.
    ///
    /// # Errors
    ///
    /// - [`FinderError::ArchiveSupportUnavailable`] if `include_archives` is
    ///   set but no reader was attached
    /// - [`FinderError::Interrupted`] if the shutdown flag is raised
    pub fn find_duplicates(
        &self,
        candidates: Vec<FileEntry>,
        include_archives: bool,
    ) -> Result<(Vec<DuplicateGroup>, ScanSummary), FinderError> {
        if include_archives && self.archive_reader.is_none() {
            return Err(FinderError::ArchiveSupportUnavailable);
        }

        let start_time = Instant::now();
        let tracker = ProgressTracker::new(self.config.progress_callback.clone());
        let mut summary = ScanSummary {
            total_candidates: candidates.len(),
            ..Default::default()
        };

        tracker.report(0.0);
        tracker.message("Collecting");
        let collected = self.collect(candidates, include_archives, &tracker, &mut summary)?;
        tracker.report(COLLECTION_SHARE);

        let (size_groups, stats) = group_by_size(collected);
        summary.eliminated_by_size = stats.eliminated_unique;

        tracker.message("Hashing");
        let mut groups = self.hash_size_groups(size_groups, &tracker, &mut summary)?;

        groups.sort_by(|a, b| {
            b.size()
                .cmp(&a.size())
                .then_with(|| a.hash().cmp(b.hash()))
        });

        summary.duplicate_groups = groups.len();
        summary.duplicate_files = groups.iter().map(|g| g.count() - 1).sum();
        summary.reclaimable_space = groups.iter().map(DuplicateGroup::wasted_space).sum();
        summary.scan_duration = start_time.elapsed();

        log::info!(
            "Scan complete: {} groups, {} duplicates, {} reclaimable in {:.2?}",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display(),
            summary.scan_duration
        );

        tracker.finish();
        Ok((groups, summary))
    }

    fn check_shutdown(&self) -> Result<(), FinderError> {
        if self.config.is_shutdown_requested() {
            log::info!("Shutdown requested, aborting scan");
            return Err(FinderError::Interrupted);
        }
        Ok(())
    }

    fn collect(
        &self,
        candidates: Vec<FileEntry>,
        include_archives: bool,
        tracker: &ProgressTracker,
        summary: &mut ScanSummary,
    ) -> Result<Vec<FileEntry>, FinderError> {
        let total = candidates.len();
        let mut collected = Vec::with_capacity(total);

        for (idx, entry) in candidates.into_iter().enumerate() {
            self.check_shutdown()?;

            if entry.is_in_archive() {
                if include_archives {
                    self.keep_if_large_enough(entry, &mut collected, summary);
                } else {
                    log::trace!("Archive support off, dropping {}", entry.path.display());
                    summary.skipped_archive_entries += 1;
                }
            } else {
                if include_archives && is_zip_path(&entry.path) {
                    self.expand_archive(&entry, &mut collected, summary);
                }
                self.keep_if_large_enough(entry, &mut collected, summary);
            }

            tracker.report_within(0.0, COLLECTION_SHARE, idx + 1, total);
        }

        log::debug!(
            "Collection: {} of {} candidates kept, {} archive entries",
            collected.len(),
            total,
            summary.archive_entries
        );
        Ok(collected)
    }

    fn keep_if_large_enough(
        &self,
        entry: FileEntry,
        collected: &mut Vec<FileEntry>,
        summary: &mut ScanSummary,
    ) {
        if entry.size == 0 || entry.size < self.config.min_size {
            log::trace!("Below minimum size ({}): {}", entry.size, entry.path.display());
            summary.eliminated_by_min_size += 1;
            return;
        }
        collected.push(entry);
    }

    fn expand_archive(
        &self,
        archive: &FileEntry,
        collected: &mut Vec<FileEntry>,
        summary: &mut ScanSummary,
    ) {
        let Some(reader) = &self.archive_reader else {
            return;
        };

        match reader.enumerate(&archive.path) {
            Ok(entries) => {
                summary.archives_expanded += 1;
                summary.archive_entries += entries.len();
                log::debug!(
                    "Expanded {} into {} entries",
                    archive.path.display(),
                    entries.len()
                );
                for item in entries {
                    let content: Arc<dyn ContentProvider> = item.content;
                    let entry = FileEntry::in_archive(&archive.path, &item.name, item.size, content)
                        .with_created(archive.created)
                        .with_modified(archive.modified);
                    self.keep_if_large_enough(entry, collected, summary);
                }
            }
            Err(e) => {
                log::warn!("Could not read archive {}: {}", archive.path.display(), e);
                summary.archive_errors.push(e);
            }
        }
    }

    fn hash_size_groups(
        &self,
        size_groups: Vec<SizeGroup>,
        tracker: &ProgressTracker,
        summary: &mut ScanSummary,
    ) -> Result<Vec<DuplicateGroup>, FinderError> {
        let total: usize = size_groups.iter().map(SizeGroup::len).sum();
        let pool = self.build_pool();
        let mut groups = Vec::new();
        let mut done = 0usize;

        log::info!(
            "Hashing {} entries in {} size groups",
            total,
            size_groups.len()
        );

        for SizeGroup { size, files } in size_groups {
            self.check_shutdown()?;
            let count = files.len();

            let results = match &pool {
                Some(pool) => pool.install(|| {
                    files
                        .into_par_iter()
                        .map(|file| self.hash_one(file))
                        .collect::<Vec<_>>()
                }),
                None => files.into_iter().map(|file| self.hash_one(file)).collect(),
            };

            self.check_shutdown()?;

            let mut hashed = Vec::with_capacity(count);
            for (mut file, result) in results {
                match result {
                    Some(Ok(hash)) => {
                        file.hash = Some(hash);
                        hashed.push(file);
                    }
                    Some(Err(e)) => {
                        log::warn!("Failed to hash {}: {}", file.path.display(), e);
                        summary.hash_errors.push(e);
                    }
                    None => {}
                }
            }
            summary.hashed_entries += hashed.len();

            let found = group_by_hash(size, hashed);
            log::debug!(
                "Size group {} bytes: {} entries, {} duplicate groups",
                size,
                count,
                found.len()
            );
            groups.extend(found);

            done += count;
            tracker.report_within(COLLECTION_SHARE, 1.0, done, total);
        }

        Ok(groups)
    }

    /// Hash one entry; `None` means it was skipped because of shutdown.
    fn hash_one(&self, file: FileEntry) -> (FileEntry, Option<Result<Hash, HashError>>) {
        if let Some(hash) = file.hash {
            return (file, Some(Ok(hash)));
        }
        if self.config.is_shutdown_requested() {
            return (file, None);
        }
        log::trace!("Hashing {}", file.path.display());
        let result = self.hasher.hash_entry(&file);
        (file, Some(result))
    }

    fn build_pool(&self) -> Option<rayon::ThreadPool> {
        if self.config.io_threads <= 1 {
            return None;
        }
        match rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads)
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!("Failed to create hashing thread pool, hashing sequentially: {}", e);
                None
            }
        }
    }
}
