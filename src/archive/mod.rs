//! Archive access for duplicate detection.
//!
//! # Overview
//!
//! The finder and the resolver only need two things from an archive: the
//! list of entries with replayable content, and a way to unpack the whole
//! thing to disk. Both are expressed by the [`ArchiveReader`] trait so the
//! core never depends on a particular container format.
//!
//! [`ZipStreamReader`] is the ZIP implementation. It walks local file headers
//! strictly in order and buffers each entry before asking for the next one,
//! because the decompression stream can only be consumed once.
//!
//! # Example
//!
//! ```no_run
//! use arcdupe::archive::{ArchiveReader, ZipStreamReader};
//! use std::path::Path;
//!
//! let reader = ZipStreamReader::new();
//! for entry in reader.enumerate(Path::new("photos.zip")).unwrap() {
//!     println!("{}: {} bytes", entry.name, entry.size);
//! }
//! ```

pub mod stream;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::scanner::BufferedContent;

pub use stream::{reconcile_size, ZipStreamReader};

/// A single non-directory entry read out of an archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Entry name inside the archive, `/`-separated
    pub name: String,
    /// Reconciled content size in bytes
    pub size: u64,
    /// The drained bytes
    pub content: Arc<BufferedContent>,
}

/// A file written by [`ArchiveReader::extract_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFile {
    /// Normalized entry name, matching [`ArchiveEntry::name`]
    pub name: String,
    /// Where the entry was written
    pub path: PathBuf,
}

/// Read-only access to archive contents.
pub trait ArchiveReader: Send + Sync {
    /// List every file entry with its buffered content.
    ///
    /// An entry whose stream fails part way is skipped with a warning and
    /// listing continues with the next header.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] if the archive is missing, is not a regular
    /// file, or cannot be decoded at all.
    fn enumerate(&self, archive: &Path) -> Result<Vec<ArchiveEntry>, ArchiveError>;

    /// Unpack every entry under `target_dir`, recreating directories.
    ///
    /// Entries are laid out by their normalized name. Unlike
    /// [`enumerate`](Self::enumerate), an unreadable entry fails the whole
    /// extraction.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError`] if the archive cannot be read, an entry name
    /// escapes `target_dir`, or an entry cannot be read or written.
    fn extract_all(
        &self,
        archive: &Path,
        target_dir: &Path,
    ) -> Result<Vec<ExtractedFile>, ArchiveError>;
}

/// Whether a path looks like a ZIP archive by extension.
#[must_use]
pub fn is_zip_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"))
}

/// Errors that can occur while reading archives.
#[derive(thiserror::Error, Debug)]
pub enum ArchiveError {
    /// The archive path does not exist.
    #[error("Archive not found: {0}")]
    NotFound(PathBuf),

    /// The archive path exists but is not a regular file.
    #[error("Not a regular file: {0}")]
    NotAFile(PathBuf),

    /// The stream could not be decoded as an archive.
    #[error("Unsupported archive {path}: {source}")]
    Unsupported {
        /// Archive path
        path: PathBuf,
        /// Decoder error
        #[source]
        source: zip::result::ZipError,
    },

    /// An entry name would escape the extraction directory.
    #[error("Unsafe entry name in {archive}: {name}")]
    UnsafeEntry {
        /// Archive path
        archive: PathBuf,
        /// Offending entry name
        name: String,
    },

    /// An I/O error occurred while reading or extracting.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl ArchiveError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
