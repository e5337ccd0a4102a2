//! Directory walker using jwalk for parallel traversal.
//!
//! # Overview
//!
//! [`Walker`] gathers plain-file candidates for the duplicate finder. It does
//! not look inside archives; `.zip` files come out as ordinary entries and
//! the finder expands them when archive support is requested.
//!
//! # Features
//!
//! - Parallel directory traversal using rayon thread pool
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Size filtering (min/max) and hidden file filtering
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use arcdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;

use super::{FileEntry, ScanError, WalkerConfig};

/// Directory walker for parallel file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build gitignore matcher from config patterns and .gitignore file.
    fn build_gitignore(&self) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(&self.root);

        let gitignore_path = self.root.join(".gitignore");
        if gitignore_path.exists() {
            if let Some(e) = builder.add(&gitignore_path) {
                log::warn!(
                    "Failed to load .gitignore from {}: {}",
                    gitignore_path.display(),
                    e
                );
            }
        }

        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    fn should_ignore(&self, path: &Path, is_dir: bool, gitignore: &Option<Gitignore>) -> bool {
        let Some(gi) = gitignore else {
            return false;
        };
        let relative_path = path.strip_prefix(&self.root).unwrap_or(path);
        let normalized = relative_path.to_string_lossy().replace('\\', "/");
        gi.matched_path_or_any_parents(normalized, is_dir)
            .is_ignore()
    }

    fn passes_size_filter(&self, size: u64) -> bool {
        if self.config.min_size.is_some_and(|min| size < min) {
            return false;
        }
        if self.config.max_size.is_some_and(|max| size > max) {
            return false;
        }
        true
    }

    /// Walk the directory tree, yielding file entries.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Children are visited in name order so results are stable.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let gitignore = self.build_gitignore();

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(|_depth, _path, _state, children| {
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir.into_iter().filter_map(move |entry_result| {
            if self.is_shutdown_requested() {
                log::debug!("Walker: Shutdown requested, stopping iteration");
                return None;
            }

            match entry_result {
                Ok(entry) => {
                    let path = entry.path();
                    let file_type = entry.file_type();

                    if file_type.is_dir() {
                        return None;
                    }

                    if self.should_ignore(&path, false, &gitignore) {
                        log::trace!("Ignoring file: {}", path.display());
                        return None;
                    }

                    if file_type.is_symlink() && !self.config.follow_symlinks {
                        log::trace!("Skipping symlink: {}", path.display());
                        return None;
                    }

                    let metadata = if self.config.follow_symlinks {
                        std::fs::metadata(&path)
                    } else {
                        std::fs::symlink_metadata(&path)
                    };

                    match metadata {
                        Ok(m) if m.is_file() => self.process_file_entry(path, &m),
                        Ok(_) => None,
                        Err(e) => Some(Err(handle_io_error(&path, e))),
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    log::warn!("Walker error for {}: {}", path.display(), e);
                    Some(Err(ScanError::Io {
                        path,
                        source: std::io::Error::other(e.to_string()),
                    }))
                }
            }
        })
    }

    fn process_file_entry(
        &self,
        path: PathBuf,
        metadata: &Metadata,
    ) -> Option<Result<FileEntry, ScanError>> {
        let size = metadata.len();

        if size == 0 {
            log::debug!("Skipping empty file: {}", path.display());
            return None;
        }

        if !self.passes_size_filter(size) {
            log::trace!("Skipping file due to size filter ({}): {}", size, path.display());
            return None;
        }

        Some(Ok(FileEntry::new(path, size)
            .with_created(metadata.created().ok())
            .with_modified(metadata.modified().ok())))
    }
}

fn handle_io_error(path: &Path, error: std::io::Error) -> ScanError {
    use std::io::ErrorKind;

    match error.kind() {
        ErrorKind::PermissionDenied => {
            log::warn!("Permission denied: {}", path.display());
            ScanError::PermissionDenied(path.to_path_buf())
        }
        ErrorKind::NotFound => {
            log::debug!("File not found (may have been deleted): {}", path.display());
            ScanError::NotFound(path.to_path_buf())
        }
        _ => {
            log::warn!("I/O error for {}: {}", path.display(), error);
            ScanError::Io {
                path: path.to_path_buf(),
                source: error,
            }
        }
    }
}

/// Walk several roots and gather every candidate.
///
/// Roots that are plain files are included directly. Returns the candidates
/// together with the per-path errors encountered along the way.
pub fn collect_candidates(
    roots: &[PathBuf],
    config: &WalkerConfig,
    shutdown_flag: Option<Arc<AtomicBool>>,
) -> (Vec<FileEntry>, Vec<ScanError>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();

    for root in roots {
        if root.is_file() {
            match FileEntry::from_path(root) {
                Ok(entry) => files.push(entry),
                Err(e) => errors.push(handle_io_error(root, e)),
            }
            continue;
        }
        if !root.exists() {
            errors.push(ScanError::NotFound(root.clone()));
            continue;
        }

        let mut walker = Walker::new(root, config.clone());
        if let Some(flag) = &shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }
        for result in walker.walk() {
            match result {
                Ok(entry) => files.push(entry),
                Err(e) => errors.push(e),
            }
        }
    }

    log::info!(
        "Collected {} candidate(s) from {} root(s), {} error(s)",
        files.len(),
        roots.len(),
        errors.len()
    );
    (files, errors)
}
