//! Duplicate group resolution.
//!
//! A [`Resolver`] turns one [`DuplicateGroup`] into a decision and carries it
//! out: pick the keeper, back up the plain copies that will go, and remove
//! them. Archive contents are never modified. When the keeper and other
//! copies share an archive, a filtered extraction of that archive is written
//! next to it instead.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Serialize, Serializer};
use tempfile::TempDir;

use super::delete::{delete_batch, validate_preserves_copy, Remover};
use crate::archive::{ArchiveError, ArchiveReader};
use crate::backup::{BackupItem, BackupStore};
use crate::duplicates::DuplicateGroup;
use crate::scanner::{normalize_internal_path, FileEntry};
use crate::selection::{SelectionError, SelectionStrategy};

/// Suffix of the directory holding a filtered archive extraction.
pub const FILTERED_SUFFIX: &str = "_conteudo_filtrado";

/// What happened to backups for a resolved group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BackupRef {
    /// Backups were not requested, or could not be taken.
    #[default]
    None,
    /// Nothing needed backing up.
    NotNeeded,
    /// Only archive entries were candidates, and those are never removed.
    NotNeededForArchiveEntries,
    /// Copies sharing the keeper's archive were handled by a filtered
    /// extraction; the archive itself was left alone.
    ArchiveUntouched,
    /// A backup would be taken; only reported by a preview.
    Planned,
    /// Id of the backup that holds the removed files.
    Created(String),
}

impl BackupRef {
    /// Id of the created backup, if any.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Created(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for BackupRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::NotNeeded => f.write_str("not-needed"),
            Self::NotNeededForArchiveEntries => f.write_str("not-needed-for-archive-entries"),
            Self::ArchiveUntouched => f.write_str("archive-untouched"),
            Self::Planned => f.write_str("planned"),
            Self::Created(id) => f.write_str(id),
        }
    }
}

impl Serialize for BackupRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of resolving one group.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionResult {
    /// The member that stays; `None` when the requested keeper was rejected
    pub kept: Option<FileEntry>,
    /// Members actually removed from disk
    pub removed: Vec<FileEntry>,
    /// Backup outcome
    pub backup: BackupRef,
    /// Archive-interior candidates left in place
    pub skipped_archive_entries: usize,
    /// Directory holding a filtered archive extraction, when one was written
    pub filtered_output: Option<PathBuf>,
    /// Every failure, joined with `"; "`
    pub error: Option<String>,
}

impl ResolutionResult {
    /// Whether the group was resolved without any failure.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Bytes freed by the removals.
    #[must_use]
    pub fn bytes_reclaimed(&self) -> u64 {
        self.removed.iter().map(|f| f.size).sum()
    }

    fn failed(message: String) -> Self {
        Self {
            error: Some(message),
            ..Self::default()
        }
    }
}

/// Errors raised before a group can be resolved at all.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The group has no members.
    #[error("cannot resolve an empty duplicate group")]
    EmptyGroup,
}

impl From<SelectionError> for ResolveError {
    fn from(err: SelectionError) -> Self {
        match err {
            SelectionError::EmptyGroup => Self::EmptyGroup,
        }
    }
}

/// Applies a keep policy to duplicate groups.
pub struct Resolver {
    strategy: Box<dyn SelectionStrategy>,
    archive_reader: Arc<dyn ArchiveReader>,
    remover: Arc<dyn Remover>,
    backup_store: Option<BackupStore>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("strategy", &self.strategy)
            .field("archive_reader", &"<reader>")
            .field("remover", &"<remover>")
            .field("backup_store", &self.backup_store)
            .field("shutdown_flag", &self.shutdown_flag.is_some())
            .finish()
    }
}

impl Resolver {
    /// Create a resolver without a backup store.
    #[must_use]
    pub fn new(
        strategy: Box<dyn SelectionStrategy>,
        archive_reader: Arc<dyn ArchiveReader>,
        remover: Arc<dyn Remover>,
    ) -> Self {
        Self {
            strategy,
            archive_reader,
            remover,
            backup_store: None,
            shutdown_flag: None,
        }
    }

    /// Store used when backups are requested.
    #[must_use]
    pub fn with_backup_store(mut self, store: BackupStore) -> Self {
        self.backup_store = Some(store);
        self
    }

    /// Flag checked between groups by [`process_all`](Self::process_all).
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

    /// Resolve one group.
    ///
    /// `override_keep` names the member to keep by path, bypassing the
    /// strategy. If it is not a member, the result carries an error and
    /// nothing is touched.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::EmptyGroup`] for a group without members.
    /// Every other failure is reported in [`ResolutionResult::error`].
    pub fn process(
        &self,
        group: &DuplicateGroup,
        create_backup: bool,
        override_keep: Option<&FileEntry>,
    ) -> Result<ResolutionResult, ResolveError> {
        if group.is_empty() {
            return Err(ResolveError::EmptyGroup);
        }

        let keeper = match override_keep {
            Some(wanted) => match group.files().iter().find(|f| f.path == wanted.path) {
                Some(member) => member.clone(),
                None => {
                    log::warn!(
                        "Requested keeper {} is not in group {}",
                        wanted.path.display(),
                        group.hash_hex()
                    );
                    return Ok(ResolutionResult::failed(format!(
                        "{} is not a member of duplicate group {}",
                        wanted.path.display(),
                        group.hash_hex()
                    )));
                }
            },
            None => self.strategy.select(group)?,
        };
        log::debug!(
            "Keeping {} ({}) for group {}",
            keeper.path.display(),
            self.strategy.name(),
            group.hash_hex()
        );

        let Candidates {
            same_archive,
            archived,
            plain,
        } = Candidates::split(&keeper, group.files());
        let mut errors = Vec::new();
        let mut result = ResolutionResult::default();

        let mut archive_untouched = false;
        if let (Some(archive), false) = (keeper.archive_path(), same_archive.is_empty()) {
            archive_untouched = true;
            match self.write_filtered_copy(archive, &same_archive) {
                Ok(output) => result.filtered_output = Some(output),
                Err(e) => {
                    log::warn!("Filtered copy of {} failed: {}", archive.display(), e);
                    errors.push(e.to_string());
                }
            }
        }

        result.skipped_archive_entries = archived.len();
        if !archived.is_empty() {
            log::debug!("Leaving {} archive entries in place", archived.len());
        }

        let mut created = None;
        if !plain.is_empty() {
            let backed_up = if create_backup {
                match self.backup(&plain) {
                    Ok(id) => {
                        created = Some(id);
                        true
                    }
                    Err(message) => {
                        log::warn!("{}", message);
                        errors.push(message);
                        false
                    }
                }
            } else {
                true
            };

            if backed_up {
                let targets: Vec<PathBuf> = plain.iter().map(|f| f.path.clone()).collect();
                match validate_preserves_copy(&group.paths(), &targets) {
                    Ok(()) => {
                        let batch = delete_batch(&targets, self.remover.as_ref());
                        let gone: HashSet<&Path> =
                            batch.successes.iter().map(|d| d.path.as_path()).collect();
                        result.removed = plain
                            .iter()
                            .filter(|f| gone.contains(f.path.as_path()))
                            .cloned()
                            .collect();
                        if let Some(joined) = batch.joined_errors() {
                            errors.push(joined);
                        }
                    }
                    Err(e) => errors.push(e.to_string()),
                }
            }
        }

        result.backup = settle_backup(
            created.map(BackupRef::Created),
            archive_untouched,
            create_backup,
            plain.is_empty(),
            result.skipped_archive_entries,
        );
        result.kept = Some(keeper);
        if !errors.is_empty() {
            result.error = Some(errors.join("; "));
        }
        Ok(result)
    }

    /// What [`process`](Self::process) would do, without touching anything.
    ///
    /// `removed` lists the plain files that would be removed and
    /// `filtered_output` the directory a filtered extraction would go to.
    /// A backup that `process` would take is reported as
    /// [`BackupRef::Planned`].
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::EmptyGroup`] for a group without members.
    pub fn preview(
        &self,
        group: &DuplicateGroup,
        create_backup: bool,
    ) -> Result<ResolutionResult, ResolveError> {
        let keeper = self.strategy.select(group)?;
        let Candidates {
            same_archive,
            archived,
            plain,
        } = Candidates::split(&keeper, group.files());

        let filtered_output = match keeper.archive_path() {
            Some(archive) if !same_archive.is_empty() => Some(filtered_output_dir(archive)),
            _ => None,
        };
        let planned = (create_backup && !plain.is_empty()).then_some(BackupRef::Planned);
        Ok(ResolutionResult {
            backup: settle_backup(
                planned,
                filtered_output.is_some(),
                create_backup,
                plain.is_empty(),
                archived.len(),
            ),
            kept: Some(keeper),
            removed: plain,
            skipped_archive_entries: archived.len(),
            filtered_output,
            error: None,
        })
    }

    /// Resolve every group in order.
    ///
    /// A group that cannot be resolved is reported through its result's
    /// `error`; the batch continues. Stops early once shutdown is requested.
    pub fn process_all(
        &self,
        groups: &[DuplicateGroup],
        create_backup: bool,
    ) -> Vec<ResolutionResult> {
        let mut results = Vec::with_capacity(groups.len());

        for group in groups {
            if self.is_shutdown_requested() {
                log::info!(
                    "Resolution interrupted after {} of {} groups",
                    results.len(),
                    groups.len()
                );
                break;
            }

            let result = self
                .process(group, create_backup, None)
                .unwrap_or_else(|e| ResolutionResult::failed(e.to_string()));

            match &result.error {
                None => log::info!(
                    "Group {}: kept {}, removed {}, backup {}",
                    group.hash_hex(),
                    result
                        .kept
                        .as_ref()
                        .map_or_else(String::new, |k| k.path.display().to_string()),
                    result.removed.len(),
                    result.backup
                ),
                Some(e) => log::warn!("Group {}: {}", group.hash_hex(), e),
            }
            results.push(result);
        }

        results
    }

    /// [`preview`](Self::preview) every group.
    ///
    /// A group that cannot be previewed is reported through its result's
    /// `error` instead of being dropped.
    #[must_use]
    pub fn preview_all(
        &self,
        groups: &[DuplicateGroup],
        create_backup: bool,
    ) -> Vec<ResolutionResult> {
        groups
            .iter()
            .map(|group| {
                self.preview(group, create_backup).unwrap_or_else(|e| {
                    log::warn!("Group {}: {}", group.hash_hex(), e);
                    ResolutionResult::failed(e.to_string())
                })
            })
            .collect()
    }

    fn backup(&self, files: &[FileEntry]) -> Result<String, String> {
        let Some(store) = &self.backup_store else {
            return Err("backup requested but no backup store is configured".to_string());
        };
        let items: Vec<BackupItem> = files.iter().map(BackupItem::from).collect();
        store
            .create(&items)
            .map_err(|e| format!("backup failed, nothing removed: {e}"))
    }

    /// Extract `archive` and copy everything except `excluded` next to it.
    fn write_filtered_copy(
        &self,
        archive: &Path,
        excluded: &[FileEntry],
    ) -> Result<PathBuf, ArchiveError> {
        let scratch = TempDir::new().map_err(|e| ArchiveError::io(archive, e))?;
        let extracted = self.archive_reader.extract_all(archive, scratch.path())?;

        let skip: HashSet<String> = excluded
            .iter()
            .filter_map(|f| f.archive.as_ref())
            .map(|m| normalize_internal_path(&m.internal_path))
            .collect();

        let output = filtered_output_dir(archive);
        fs::create_dir_all(&output).map_err(|e| ArchiveError::io(&output, e))?;

        let mut copied = 0usize;
        for file in extracted {
            if skip.contains(&file.name) {
                log::trace!("Filtered out {}", file.name);
                continue;
            }
            let Ok(relative) = file.path.strip_prefix(scratch.path()) else {
                continue;
            };
            let dest = output.join(relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e))?;
            }
            fs::copy(&file.path, &dest).map_err(|e| ArchiveError::io(&dest, e))?;
            copied += 1;
        }

        log::info!(
            "Wrote filtered copy of {} to {} ({} files, {} excluded)",
            archive.display(),
            output.display(),
            copied,
            skip.len()
        );
        Ok(output)
    }
}

/// Backup outcome for a group, most specific first.
fn settle_backup(
    taken: Option<BackupRef>,
    archive_untouched: bool,
    create_backup: bool,
    plain_empty: bool,
    skipped_archive_entries: usize,
) -> BackupRef {
    match taken {
        Some(backup) => backup,
        None if archive_untouched => BackupRef::ArchiveUntouched,
        None if !create_backup => BackupRef::None,
        None if plain_empty && skipped_archive_entries > 0 => {
            BackupRef::NotNeededForArchiveEntries
        }
        None if plain_empty => BackupRef::NotNeeded,
        None => BackupRef::None,
    }
}

/// Group members other than the keeper, by how they are handled.
struct Candidates {
    /// Entries in the keeper's own archive
    same_archive: Vec<FileEntry>,
    /// Entries in other archives
    archived: Vec<FileEntry>,
    /// Plain files
    plain: Vec<FileEntry>,
}

impl Candidates {
    fn split(keeper: &FileEntry, files: &[FileEntry]) -> Self {
        let mut split = Self {
            same_archive: Vec::new(),
            archived: Vec::new(),
            plain: Vec::new(),
        };
        let keeper_archive = keeper.archive_path();
        for file in files.iter().filter(|f| f.path != keeper.path) {
            match file.archive_path() {
                Some(archive) if Some(archive) == keeper_archive => {
                    split.same_archive.push(file.clone());
                }
                Some(_) => split.archived.push(file.clone()),
                None => split.plain.push(file.clone()),
            }
        }
        split
    }
}

/// `<archive_dir>/<stem>_conteudo_filtrado`
#[must_use]
pub fn filtered_output_dir(archive: &Path) -> PathBuf {
    let stem = archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = archive.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{stem}{FILTERED_SUFFIX}"))
}
