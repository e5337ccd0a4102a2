//! Reversible file removal using the trash crate.
//!
//! # Overview
//!
//! The resolver only needs the capability "remove this file, recoverably".
//! [`Remover`] expresses that; [`TrashRemover`] implements it with the
//! system recycle bin and [`PermanentRemover`] with a plain unlink for
//! callers that have made their own copies.
//!
//! # Example
//!
//! ```no_run
//! use arcdupe::actions::delete::{Remover, TrashRemover};
//! use std::path::Path;
//!
//! match TrashRemover.remove(Path::new("/path/to/duplicate.txt")) {
//!     Ok(result) => println!("Moved to trash: {}", result.path.display()),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed {
        /// File that could not be trashed
        path: PathBuf,
        /// Message from the platform trash
        message: String,
    },

    /// Attempted to delete all copies (at least one must be preserved).
    #[error("cannot delete all copies - at least one file must be preserved")]
    AllCopiesWouldBeDeleted,

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error (if any).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::Io { path: p, .. } => Some(p),
            Self::AllCopiesWouldBeDeleted => None,
        }
    }

    /// Map a metadata/unlink failure onto the error kinds callers match on.
    #[must_use]
    pub fn from_io(path: &Path, error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}

/// Result of a successful deletion operation.
#[derive(Debug, Clone)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Whether deletion was permanent (true) or recoverable (false).
    pub permanent: bool,
}

impl DeleteResult {
    /// Create a new delete result.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, permanent: bool) -> Self {
        Self {
            path,
            size,
            permanent,
        }
    }
}

/// Capability to take a file off disk.
pub trait Remover: Send + Sync {
    /// Remove `path`.
    ///
    /// # Errors
    ///
    /// Returns [`DeleteError`] if the file is missing or cannot be removed.
    fn remove(&self, path: &Path) -> Result<DeleteResult, DeleteError>;

    /// Whether removed files can be recovered without a backup.
    fn is_reversible(&self) -> bool {
        true
    }
}

/// Moves files to the system trash.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrashRemover;

impl Remover for TrashRemover {
    fn remove(&self, path: &Path) -> Result<DeleteResult, DeleteError> {
        delete_to_trash(path)
    }
}

/// Unlinks files outright.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermanentRemover;

impl Remover for PermanentRemover {
    fn remove(&self, path: &Path) -> Result<DeleteResult, DeleteError> {
        permanent_delete(path)
    }

    fn is_reversible(&self) -> bool {
        false
    }
}

/// Results of a batch deletion operation.
#[derive(Debug, Default)]
pub struct BatchDeleteResult {
    /// Successfully deleted files.
    pub successes: Vec<DeleteResult>,
    /// Failed deletions with their errors.
    pub failures: Vec<DeleteError>,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl BatchDeleteResult {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Every failure message joined with `"; "`, if any failed.
    #[must_use]
    pub fn joined_errors(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        Some(
            self.failures
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!(
                "Deleted {} file(s), freed {} bytes",
                self.success_count(),
                self.bytes_freed
            )
        } else {
            format!(
                "Deleted {} file(s), {} failed, freed {} bytes",
                self.success_count(),
                self.failure_count(),
                self.bytes_freed
            )
        }
    }
}

fn file_size(path: &Path) -> Result<u64, DeleteError> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| DeleteError::from_io(path, e))
}

/// Delete a single file to the system trash.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = file_size(path)?;

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {} ({} bytes)", path.display(), size);
    Ok(DeleteResult::new(path.to_path_buf(), size, false))
}

/// Permanently delete a single file.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `Io` for any other failure
pub fn permanent_delete(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = file_size(path)?;
    fs::remove_file(path).map_err(|e| DeleteError::from_io(path, e))?;
    log::info!("Permanently deleted: {} ({} bytes)", path.display(), size);
    Ok(DeleteResult::new(path.to_path_buf(), size, true))
}

/// Remove every path, continuing past failures.
pub fn delete_batch(paths: &[PathBuf], remover: &dyn Remover) -> BatchDeleteResult {
    let mut result = BatchDeleteResult::default();

    for path in paths {
        match remover.remove(path) {
            Ok(deleted) => {
                result.bytes_freed += deleted.size;
                result.successes.push(deleted);
            }
            Err(e) => {
                log::warn!("Failed to remove {}: {}", path.display(), e);
                result.failures.push(e);
            }
        }
    }

    log::debug!("{}", result.summary());
    result
}

/// Check that removing `to_remove` leaves at least one of `members`.
///
/// # Errors
///
/// Returns [`DeleteError::AllCopiesWouldBeDeleted`] otherwise.
pub fn validate_preserves_copy(members: &[PathBuf], to_remove: &[PathBuf]) -> Result<(), DeleteError> {
    if members.iter().all(|m| to_remove.contains(m)) {
        return Err(DeleteError::AllCopiesWouldBeDeleted);
    }
    Ok(())
}
