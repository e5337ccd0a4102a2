//! Scanner module for candidate collection and content hashing.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - Content hashing with BLAKE3 (plain files and archive-interior entries)
//! - The [`FileEntry`] candidate model shared by every other module
//!
//! # Architecture
//!
//! - [`walker`]: Directory traversal and candidate discovery
//! - [`hasher`]: BLAKE3 hashing over files and replayable content
//!
//! # Example
//!
//! ```no_run
//! use arcdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let config = WalkerConfig {
//!     min_size: Some(1024),
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(Path::new("."), config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::fmt;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use serde::Serialize;

pub use hasher::{hash_to_hex, hex_to_hash, Hash, Hasher, CHUNK_SIZE};
pub use walker::Walker;

/// Source of an entry's bytes that can be read any number of times.
///
/// Every call to [`open`](ContentProvider::open) returns a fresh reader
/// positioned at the start of the logical content.
pub trait ContentProvider: Send + Sync + fmt::Debug {
    /// Open a new reader over the full content.
    fn open(&self) -> io::Result<Box<dyn Read + Send>>;

    /// Length of the content in bytes, when known without reading it.
    fn len_hint(&self) -> Option<u64> {
        None
    }
}

/// Content held fully in memory.
///
/// Archive entries end up here because the underlying decompression stream
/// can only be walked once.
#[derive(Clone)]
pub struct BufferedContent {
    data: Arc<[u8]>,
}

impl BufferedContent {
    /// Wrap an owned buffer.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data: data.into() }
    }

    /// Borrow the buffered bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Number of buffered bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for BufferedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedContent")
            .field("len", &self.data.len())
            .finish()
    }
}

impl ContentProvider for BufferedContent {
    fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(Arc::clone(&self.data))))
    }

    fn len_hint(&self) -> Option<u64> {
        Some(self.data.len() as u64)
    }
}

/// Location of an entry inside a ZIP archive.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveMember {
    /// Path of the archive file on disk
    pub archive_path: PathBuf,
    /// Entry name inside the archive, always `/`-separated
    pub internal_path: String,
    /// Replayable access to the entry's bytes
    #[serde(skip)]
    pub content: Arc<dyn ContentProvider>,
}

/// A file or archive-interior item under consideration for deduplication.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// Filesystem path, or `"<archive>:<internal>"` for archive entries
    pub path: PathBuf,
    /// Content size in bytes
    pub size: u64,
    /// BLAKE3 content hash once computed
    #[serde(serialize_with = "serialize_hash")]
    pub hash: Option<Hash>,
    /// Creation time, when the platform reports one
    pub created: Option<SystemTime>,
    /// Last modification time
    pub modified: Option<SystemTime>,
    /// Present when this entry lives inside an archive
    pub archive: Option<ArchiveMember>,
}

fn serialize_hash<S>(hash: &Option<Hash>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match hash {
        Some(h) => serializer.serialize_some(&hash_to_hex(h)),
        None => serializer.serialize_none(),
    }
}

impl FileEntry {
    /// Create an entry for a plain file.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            hash: None,
            created: None,
            modified: None,
            archive: None,
        }
    }

    /// Create an entry for an item inside an archive.
    ///
    /// The display path becomes the virtual identifier
    /// `"<archive_path>:<internal_path>"`.
    #[must_use]
    pub fn in_archive(
        archive_path: &Path,
        internal_path: &str,
        size: u64,
        content: Arc<dyn ContentProvider>,
    ) -> Self {
        let internal_path = normalize_internal_path(internal_path);
        Self {
            path: PathBuf::from(virtual_id(archive_path, &internal_path)),
            size,
            hash: None,
            created: None,
            modified: None,
            archive: Some(ArchiveMember {
                archive_path: archive_path.to_path_buf(),
                internal_path,
                content,
            }),
        }
    }

    /// Build a plain entry from filesystem metadata.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the path cannot be stat'ed.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self::new(path.to_path_buf(), metadata.len())
            .with_created(metadata.created().ok())
            .with_modified(metadata.modified().ok()))
    }

    /// Set the creation time.
    #[must_use]
    pub fn with_created(mut self, created: Option<SystemTime>) -> Self {
        self.created = created;
        self
    }

    /// Set the modification time.
    #[must_use]
    pub fn with_modified(mut self, modified: Option<SystemTime>) -> Self {
        self.modified = modified;
        self
    }

    /// Set a precomputed hash.
    #[must_use]
    pub fn with_hash(mut self, hash: Hash) -> Self {
        self.hash = Some(hash);
        self
    }

    /// Whether this entry lives inside an archive.
    #[must_use]
    pub fn is_in_archive(&self) -> bool {
        self.archive.is_some()
    }

    /// Archive path for archive-interior entries.
    #[must_use]
    pub fn archive_path(&self) -> Option<&Path> {
        self.archive.as_ref().map(|a| a.archive_path.as_path())
    }

    /// Final name component: the file name, or the last segment of the
    /// internal path for archive entries.
    #[must_use]
    pub fn file_name(&self) -> String {
        match &self.archive {
            Some(member) => member
                .internal_path
                .rsplit('/')
                .next()
                .unwrap_or(&member.internal_path)
                .to_string(),
            None => self
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.to_string_lossy().into_owned()),
        }
    }

    /// Lowercased extension of [`file_name`](Self::file_name), if any.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name();
        Path::new(&name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
    }

    /// Open a reader over the entry's content.
    ///
    /// # Errors
    ///
    /// Returns the I/O error from opening the file or the content provider.
    pub fn open(&self) -> io::Result<Box<dyn Read + Send>> {
        match &self.archive {
            Some(member) => member.content.open(),
            None => Ok(Box::new(std::fs::File::open(&self.path)?)),
        }
    }
}

/// Normalize an archive-internal path.
///
/// Both `/` and `\` separate components; empty and `.` components are
/// dropped, so `./dir\a.txt` and `dir/a.txt` name the same entry. `..` is
/// kept as-is for the extractor to reject.
#[must_use]
pub fn normalize_internal_path(internal: &str) -> String {
    internal
        .split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Virtual identifier for an archive-interior entry.
#[must_use]
pub fn virtual_id(archive_path: &Path, internal_path: &str) -> String {
    format!(
        "{}:{}",
        archive_path.display(),
        normalize_internal_path(internal_path)
    )
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,

    /// Maximum file size to include (in bytes).
    pub max_size: Option<u64>,

    /// Glob patterns to ignore (gitignore-style).
    pub ignore_patterns: Vec<String>,
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Errors that can occur during hashing.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    /// The specified file was not found.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when reading the file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// An I/O error occurred while reading the content.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl HashError {
    pub(crate) fn from_io(path: &Path, error: io::Error) -> Self {
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
