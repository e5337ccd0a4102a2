//! Manifest types describing one backup.
//!
//! A manifest is serialized as `metadata/<id>.json` under the backup root
//! and records every stored file with enough metadata to put it back.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::scanner::{hash_to_hex, FileEntry, Hash};

/// A file to be copied into a backup.
#[derive(Debug, Clone)]
pub struct BackupItem {
    /// Where the file lives now
    pub original_path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Content hash, when already known
    pub hash: Option<Hash>,
    /// Creation time
    pub created: Option<SystemTime>,
    /// Last modification time
    pub modified: Option<SystemTime>,
}

impl BackupItem {
    /// Describe a file by path alone.
    #[must_use]
    pub fn new(original_path: PathBuf, size: u64) -> Self {
        Self {
            original_path,
            size,
            hash: None,
            created: None,
            modified: None,
        }
    }

    /// Extension of the original file including the leading dot, or empty.
    #[must_use]
    pub fn dotted_extension(&self) -> String {
        self.original_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default()
    }
}

impl From<&FileEntry> for BackupItem {
    fn from(entry: &FileEntry) -> Self {
        Self {
            original_path: entry.path.clone(),
            size: entry.size,
            hash: entry.hash,
            created: entry.created,
            modified: entry.modified,
        }
    }
}

/// One stored file inside a backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupRecord {
    /// Path the file was copied from
    pub original_path: PathBuf,
    /// Name of the copy inside the backup's storage directory
    pub stored_name: String,
    /// Size in bytes
    pub size: u64,
    /// Content hash (hex), when known at backup time
    pub hash: Option<String>,
    /// Creation time of the original
    pub created: Option<DateTime<Utc>>,
    /// Modification time of the original
    pub modified: Option<DateTime<Utc>>,
}

impl BackupRecord {
    pub(crate) fn new(item: &BackupItem, stored_name: String) -> Self {
        Self {
            original_path: item.original_path.clone(),
            stored_name,
            size: item.size,
            hash: item.hash.as_ref().map(hash_to_hex),
            created: item.created.map(DateTime::<Utc>::from),
            modified: item.modified.map(DateTime::<Utc>::from),
        }
    }

    /// File name of the original path.
    #[must_use]
    pub fn original_file_name(&self) -> PathBuf {
        self.original_path
            .file_name()
            .map_or_else(|| PathBuf::from(&self.stored_name), PathBuf::from)
    }
}

/// Everything needed to restore one backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupManifest {
    /// Backup identifier
    pub id: String,
    /// When the backup was taken
    pub created_at: DateTime<Utc>,
    /// Stored files
    pub files: Vec<BackupRecord>,
    /// Number of stored files
    pub file_count: usize,
    /// Sum of stored file sizes
    pub total_size: u64,
}

impl BackupManifest {
    pub(crate) fn new(id: String, files: Vec<BackupRecord>) -> Self {
        let total_size = files.iter().map(|f| f.size).sum();
        Self {
            id,
            created_at: Utc::now(),
            file_count: files.len(),
            total_size,
            files,
        }
    }

    /// Whether the manifest lists `path` as an original.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f.original_path == path)
    }
}

/// Listing view of a backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupSummary {
    /// Backup identifier
    pub id: String,
    /// When the backup was taken
    pub created_at: DateTime<Utc>,
    /// Number of stored files
    pub file_count: usize,
    /// Sum of stored file sizes
    pub total_size: u64,
}

impl From<&BackupManifest> for BackupSummary {
    fn from(manifest: &BackupManifest) -> Self {
        Self {
            id: manifest.id.clone(),
            created_at: manifest.created_at,
            file_count: manifest.file_count,
            total_size: manifest.total_size,
        }
    }
}
