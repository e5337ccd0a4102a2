//! On-disk backup store.
//!
//! Layout under the root:
//!
//! ```text
//! <root>/metadata/<id>.json          manifest
//! <root>/files/<id>/<stored_name>    copies
//! ```
//!
//! The store assumes a single writer; there is no locking.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::manifest::{BackupItem, BackupManifest, BackupRecord, BackupSummary};
use crate::scanner::hash_to_hex;

const METADATA_DIR: &str = "metadata";
const FILES_DIR: &str = "files";

/// Errors that can occur in the backup store.
#[derive(thiserror::Error, Debug)]
pub enum BackupError {
    /// No backup with this id exists.
    #[error("Backup not found: {0}")]
    NotFound(String),

    /// A manifest could not be parsed or written.
    #[error("Invalid manifest {path}: {source}")]
    Manifest {
        /// Manifest path
        path: PathBuf,
        /// Serialization error
        #[source]
        source: serde_json::Error,
    },

    /// An I/O error occurred.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl BackupError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Content-addressed copies of files, grouped into restorable backups.
#[derive(Debug, Clone)]
pub struct BackupStore {
    root: PathBuf,
}

impl BackupStore {
    /// Open (lazily) a store rooted at `root`.
    ///
    /// Nothing is created on disk until the first backup is taken.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn manifest_path(&self, id: &str) -> PathBuf {
        self.root.join(METADATA_DIR).join(format!("{id}.json"))
    }

    /// Directory holding the copies for backup `id`.
    #[must_use]
    pub fn storage_dir(&self, id: &str) -> PathBuf {
        self.root.join(FILES_DIR).join(id)
    }

    /// Reject ids that are not ours before they touch the filesystem.
    fn checked_id<'a>(&self, id: &'a str) -> Result<&'a str, BackupError> {
        match Uuid::parse_str(id) {
            Ok(_) => Ok(id),
            Err(_) => Err(BackupError::NotFound(id.to_string())),
        }
    }

    /// Copy `items` into a new backup and return its id.
    ///
    /// Items whose source no longer exists are skipped with a warning. Any
    /// other failure aborts the backup and removes what was copied so far.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError`] if a copy or the manifest write fails.
    pub fn create(&self, items: &[BackupItem]) -> Result<String, BackupError> {
        let id = Uuid::new_v4().to_string();
        let storage = self.storage_dir(&id);

        match self.write_backup(&id, &storage, items) {
            Ok(manifest) => {
                log::info!(
                    "Created backup {} ({} files, {} bytes)",
                    id,
                    manifest.file_count,
                    manifest.total_size
                );
                Ok(id)
            }
            Err(e) => {
                log::warn!("Backup {} failed, cleaning up: {}", id, e);
                if storage.exists() {
                    if let Err(cleanup) = fs::remove_dir_all(&storage) {
                        log::warn!("Failed to remove {}: {}", storage.display(), cleanup);
                    }
                }
                Err(e)
            }
        }
    }

    fn write_backup(
        &self,
        id: &str,
        storage: &Path,
        items: &[BackupItem],
    ) -> Result<BackupManifest, BackupError> {
        fs::create_dir_all(storage).map_err(|e| BackupError::io(storage, e))?;

        let mut records = Vec::with_capacity(items.len());
        for item in items {
            if !item.original_path.exists() {
                log::warn!(
                    "Skipping backup of missing file: {}",
                    item.original_path.display()
                );
                continue;
            }

            let stored_name = stored_name_for(item);
            let dest = storage.join(&stored_name);
            fs::copy(&item.original_path, &dest)
                .map_err(|e| BackupError::io(&item.original_path, e))?;
            log::trace!("Backed up {} as {}", item.original_path.display(), stored_name);
            records.push(BackupRecord::new(item, stored_name));
        }

        let manifest = BackupManifest::new(id.to_string(), records);
        self.write_manifest(&manifest)?;
        Ok(manifest)
    }

    /// Write the manifest to a temp file and rename it into place.
    fn write_manifest(&self, manifest: &BackupManifest) -> Result<(), BackupError> {
        let path = self.manifest_path(&manifest.id);
        let dir = self.root.join(METADATA_DIR);
        fs::create_dir_all(&dir).map_err(|e| BackupError::io(&dir, e))?;

        let json = serde_json::to_vec_pretty(manifest).map_err(|e| BackupError::Manifest {
            path: path.clone(),
            source: e,
        })?;

        let tmp = path.with_extension("json.tmp");
        let result = fs::File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(&json)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&tmp, &path));

        if let Err(e) = result {
            let _ = fs::remove_file(&tmp);
            return Err(BackupError::io(&path, e));
        }
        Ok(())
    }

    /// Summaries of every readable backup, newest first.
    ///
    /// Manifests that cannot be parsed are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::Io`] if the metadata directory cannot be read.
    pub fn list(&self) -> Result<Vec<BackupSummary>, BackupError> {
        let dir = self.root.join(METADATA_DIR);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| BackupError::io(&dir, e))? {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    log::warn!("Unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match read_manifest(&path) {
                Ok(manifest) => summaries.push(BackupSummary::from(&manifest)),
                Err(e) => log::warn!("Skipping corrupt manifest: {}", e),
            }
        }

        summaries.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(summaries)
    }

    /// Load the manifest for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::NotFound`] for an unknown id, or
    /// [`BackupError::Manifest`] if the manifest is unreadable.
    pub fn get(&self, id: &str) -> Result<BackupManifest, BackupError> {
        let id = self.checked_id(id)?;
        let path = self.manifest_path(id);
        if !path.is_file() {
            return Err(BackupError::NotFound(id.to_string()));
        }
        read_manifest(&path)
    }

    /// Copy a backup's files back out.
    ///
    /// Without `target` every file returns to its original path, recreating
    /// parent directories. With `target` every file is copied flat into that
    /// directory under its original file name.
    ///
    /// Returns the paths written.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::NotFound`] for an unknown id, or
    /// [`BackupError::Io`] on the first file that cannot be restored.
    pub fn restore(&self, id: &str, target: Option<&Path>) -> Result<Vec<PathBuf>, BackupError> {
        let manifest = self.get(id)?;
        let storage = self.storage_dir(&manifest.id);
        let mut restored = Vec::with_capacity(manifest.files.len());

        for record in &manifest.files {
            let src = storage.join(&record.stored_name);
            let dest = match target {
                Some(dir) => dir.join(record.original_file_name()),
                None => record.original_path.clone(),
            };
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| BackupError::io(parent, e))?;
            }
            fs::copy(&src, &dest).map_err(|e| BackupError::io(&src, e))?;
            log::debug!("Restored {} to {}", record.stored_name, dest.display());
            restored.push(dest);
        }

        log::info!("Restored backup {} ({} files)", manifest.id, restored.len());
        Ok(restored)
    }

    /// Remove a backup's copies and manifest.
    ///
    /// Both removals are attempted; the first failure is returned.
    ///
    /// # Errors
    ///
    /// Returns [`BackupError::NotFound`] for an unknown id, or
    /// [`BackupError::Io`] if either removal fails.
    pub fn delete(&self, id: &str) -> Result<(), BackupError> {
        let id = self.checked_id(id)?;
        let manifest = self.manifest_path(id);
        if !manifest.is_file() {
            return Err(BackupError::NotFound(id.to_string()));
        }

        let storage = self.storage_dir(id);
        let storage_result = if storage.exists() {
            fs::remove_dir_all(&storage).map_err(|e| BackupError::io(&storage, e))
        } else {
            Ok(())
        };
        let manifest_result =
            fs::remove_file(&manifest).map_err(|e| BackupError::io(&manifest, e));

        storage_result?;
        manifest_result?;
        log::info!("Deleted backup {}", id);
        Ok(())
    }
}

/// Name used for an item's copy: hash-addressed when the hash is known.
fn stored_name_for(item: &BackupItem) -> String {
    let stem = match &item.hash {
        Some(hash) => hash_to_hex(hash),
        None => Uuid::new_v4().simple().to_string(),
    };
    format!("{}{}", stem, item.dotted_extension())
}

fn read_manifest(path: &Path) -> Result<BackupManifest, BackupError> {
    let bytes = fs::read(path).map_err(|e| BackupError::io(path, e))?;
    serde_json::from_slice(&bytes).map_err(|e| BackupError::Manifest {
        path: path.to_path_buf(),
        source: e,
    })
}
