//! Duplicate grouping and size-based file organization.
//!
//! # Overview
//!
//! Size grouping is the first pass of duplicate detection: files of
//! different sizes cannot share content, so every size seen only once is
//! dropped before any byte is hashed. Entries that survive are hashed and
//! collected into [`DuplicateGroup`]s.
//!
//! # Example
//!
//! ```
//! use arcdupe::scanner::FileEntry;
//! use arcdupe::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/file1.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file2.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(groups.len(), 1);
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::scanner::{hash_to_hex, FileEntry, Hash};

/// A set of entries sharing one size.
#[derive(Debug, Clone)]
pub struct SizeGroup {
    /// File size in bytes (shared by all files in this group)
    pub size: u64,
    /// Files with this exact size, in encounter order
    pub files: Vec<FileEntry>,
}

impl SizeGroup {
    /// Create a size group with initial files.
    #[must_use]
    pub fn with_files(size: u64, files: Vec<FileEntry>) -> Self {
        Self { size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Potential space savings (all copies minus one).
    #[must_use]
    pub fn potential_savings(&self) -> u64 {
        self.size * (self.files.len().saturating_sub(1) as u64)
    }
}

/// Confirmed set of entries with byte-identical content.
///
/// Every member shares [`hash`](Self::hash) and [`size`](Self::size);
/// [`add`](Self::add) refuses anything that would break that.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateGroup {
    #[serde(serialize_with = "serialize_hash_hex")]
    hash: Hash,
    size: u64,
    files: Vec<FileEntry>,
}

fn serialize_hash_hex<S>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&hash_to_hex(hash))
}

impl DuplicateGroup {
    /// Create an empty group for the given content hash and size.
    #[must_use]
    pub fn new(hash: Hash, size: u64) -> Self {
        Self {
            hash,
            size,
            files: Vec::new(),
        }
    }

    /// Build a group from already-hashed entries.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError`] if any entry disagrees on hash or size.
    pub fn from_files(hash: Hash, size: u64, files: Vec<FileEntry>) -> Result<Self, GroupError> {
        let mut group = Self::new(hash, size);
        for file in files {
            group.add(file)?;
        }
        Ok(group)
    }

    /// Append a member.
    ///
    /// # Errors
    ///
    /// - [`GroupError::MissingHash`] if the entry was never hashed
    /// - [`GroupError::HashMismatch`] if its hash differs from the group's
    /// - [`GroupError::SizeMismatch`] if its size differs from the group's
    pub fn add(&mut self, file: FileEntry) -> Result<(), GroupError> {
        match file.hash {
            None => return Err(GroupError::MissingHash(file.path)),
            Some(h) if h != self.hash => {
                return Err(GroupError::HashMismatch {
                    path: file.path,
                    expected: hash_to_hex(&self.hash),
                    actual: hash_to_hex(&h),
                })
            }
            Some(_) => {}
        }
        if file.size != self.size {
            return Err(GroupError::SizeMismatch {
                path: file.path,
                expected: self.size,
                actual: file.size,
            });
        }
        self.files.push(file);
        Ok(())
    }

    /// Shared content hash.
    #[must_use]
    pub fn hash(&self) -> &Hash {
        &self.hash
    }

    /// Per-file size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Number of members.
    #[must_use]
    pub fn count(&self) -> usize {
        self.files.len()
    }

    /// Check if this group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Members in insertion order.
    #[must_use]
    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    /// Bytes reclaimable by keeping a single copy.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * (self.files.len().saturating_sub(1) as u64)
    }

    /// Hash as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        hash_to_hex(&self.hash)
    }

    /// Display paths of the members.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// Whether any member has the given display path.
    #[must_use]
    pub fn contains_path(&self, path: &std::path::Path) -> bool {
        self.files.iter().any(|f| f.path == path)
    }
}

/// Errors raised when a group's shared-content invariant would break.
#[derive(thiserror::Error, Debug)]
pub enum GroupError {
    /// The entry has no content hash yet.
    #[error("Entry has not been hashed: {0}")]
    MissingHash(PathBuf),

    /// The entry's hash differs from the group's.
    #[error("Hash mismatch for {path}: expected {expected}, got {actual}")]
    HashMismatch {
        /// Entry path
        path: PathBuf,
        /// Group hash (hex)
        expected: String,
        /// Entry hash (hex)
        actual: String,
    },

    /// The entry's size differs from the group's.
    #[error("Size mismatch for {path}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Entry path
        path: PathBuf,
        /// Group size
        expected: u64,
        /// Entry size
        actual: u64,
    },
}

/// Statistics from size grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Number of unique file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in groups of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton groups)
    pub eliminated_unique: usize,
    /// Number of empty files encountered
    pub empty_files: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size, discarding sizes seen only once.
///
/// Empty files are dropped. Files keep their encounter order within each
/// returned group.
///
/// # Example
///
/// ```
/// use arcdupe::scanner::FileEntry;
/// use arcdupe::duplicates::group_by_size;
/// use std::path::PathBuf;
///
/// let files = vec![
///     FileEntry::new(PathBuf::from("/a.txt"), 100),
///     FileEntry::new(PathBuf::from("/b.txt"), 100),
///     FileEntry::new(PathBuf::from("/c.txt"), 200),
/// ];
///
/// let (groups, stats) = group_by_size(files);
///
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[0].size, 100);
/// assert_eq!(stats.eliminated_unique, 1);
/// ```
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileEntry>,
) -> (Vec<SizeGroup>, GroupingStats) {
    let mut all_groups: HashMap<u64, Vec<FileEntry>> = HashMap::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        if file.size == 0 {
            stats.empty_files += 1;
            log::trace!("Empty file skipped: {}", file.path.display());
            continue;
        }
        all_groups.entry(file.size).or_default().push(file);
    }

    stats.unique_sizes = all_groups.len();

    let mut groups: Vec<SizeGroup> = all_groups
        .into_iter()
        .filter_map(|(size, files)| {
            if files.len() == 1 {
                stats.eliminated_unique += 1;
                log::trace!("Eliminated unique size {}: {}", size, files[0].path.display());
                None
            } else {
                stats.potential_duplicates += files.len();
                log::debug!("Size group {} bytes: {} potential duplicates", size, files.len());
                Some(SizeGroup::with_files(size, files))
            }
        })
        .collect();

    groups.sort_by(|a, b| b.size.cmp(&a.size));

    log::info!(
        "Size grouping: {} files → {} potential duplicates ({:.1}% eliminated)",
        stats.total_files,
        stats.potential_duplicates,
        stats.elimination_rate()
    );

    (groups, stats)
}

/// Split hashed entries of one size into duplicate groups.
///
/// Entries without a hash are ignored. Only buckets with two or more members
/// become groups; bucket order follows first appearance.
#[must_use]
pub fn group_by_hash(size: u64, files: Vec<FileEntry>) -> Vec<DuplicateGroup> {
    let mut order: Vec<Hash> = Vec::new();
    let mut buckets: HashMap<Hash, Vec<FileEntry>> = HashMap::new();

    for file in files {
        let Some(hash) = file.hash else {
            continue;
        };
        let bucket = buckets.entry(hash).or_insert_with(|| {
            order.push(hash);
            Vec::new()
        });
        bucket.push(file);
    }

    order
        .into_iter()
        .filter_map(|hash| {
            let files = buckets.remove(&hash)?;
            if files.len() < 2 {
                return None;
            }
            let mut group = DuplicateGroup::new(hash, size);
            for file in files {
                if let Err(e) = group.add(file) {
                    log::warn!("Dropping inconsistent entry: {}", e);
                }
            }
            (group.count() >= 2).then_some(group)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_file(path: &str, size: u64) -> FileEntry {
        FileEntry::new(PathBuf::from(path), size)
    }

    fn hashed(path: &str, size: u64, byte: u8) -> FileEntry {
        make_file(path, size).with_hash([byte; 32])
    }

    // ==================== Size Grouping Tests ====================

    #[test]
    fn test_group_by_size_empty_input() {
        let (groups, stats) = group_by_size(Vec::new());
        assert!(groups.is_empty());
        assert_eq!(stats, GroupingStats::default());
    }

    #[test]
    fn test_group_by_size_drops_singletons_and_empty() {
        let files = vec![
            make_file("/a", 100),
            make_file("/b", 100),
            make_file("/c", 200),
            make_file("/d", 0),
            make_file("/e", 0),
        ];
        let (groups, stats) = group_by_size(files);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].size, 100);
        assert_eq!(stats.total_files, 5);
        assert_eq!(stats.empty_files, 2);
        assert_eq!(stats.eliminated_unique, 1);
        assert_eq!(stats.unique_sizes, 2);
    }

    #[test]
    fn test_group_by_size_sorted_descending_and_stable() {
        let files = vec![
            make_file("/s1", 10),
            make_file("/l1", 300),
            make_file("/s2", 10),
            make_file("/l2", 300),
        ];
        let (groups, _) = group_by_size(files);

        assert_eq!(groups[0].size, 300);
        assert_eq!(groups[1].size, 10);
        assert_eq!(groups[0].files[0].path, PathBuf::from("/l1"));
        assert_eq!(groups[0].files[1].path, PathBuf::from("/l2"));
        assert_eq!(groups[1].potential_savings(), 10);
    }

    // ==================== Duplicate Group Tests ====================

    #[test]
    fn test_duplicate_group_add_checks_hash_and_size() {
        let mut group = DuplicateGroup::new([1; 32], 50);

        assert!(group.add(hashed("/a", 50, 1)).is_ok());
        assert!(matches!(
            group.add(hashed("/b", 50, 2)),
            Err(GroupError::HashMismatch { .. })
        ));
        assert!(matches!(
            group.add(hashed("/c", 51, 1)),
            Err(GroupError::SizeMismatch { .. })
        ));
        assert!(matches!(
            group.add(make_file("/d", 50)),
            Err(GroupError::MissingHash(_))
        ));
        assert_eq!(group.count(), 1);
    }

    #[test]
    fn test_duplicate_group_accessors() {
        let group = DuplicateGroup::from_files(
            [0xAB; 32],
            1000,
            vec![hashed("/a", 1000, 0xAB), hashed("/b", 1000, 0xAB), hashed("/c", 1000, 0xAB)],
        )
        .unwrap();

        assert_eq!(group.size(), 1000);
        assert_eq!(group.count(), 3);
        assert_eq!(group.wasted_space(), 2000);
        assert!(group.hash_hex().starts_with("abab"));
        assert_eq!(group.paths()[2], PathBuf::from("/c"));
        assert!(group.contains_path(std::path::Path::new("/b")));
    }

    #[test]
    fn test_duplicate_group_serializes_hex_hash() {
        let group = DuplicateGroup::from_files(
            [0x01; 32],
            4,
            vec![hashed("/a", 4, 1), hashed("/b", 4, 1)],
        )
        .unwrap();
        let json = serde_json::to_value(&group).unwrap();

        assert_eq!(json["hash"].as_str().unwrap().len(), 64);
        assert_eq!(json["size"], 4);
        assert_eq!(json["files"].as_array().unwrap().len(), 2);
    }

    // ==================== Hash Grouping Tests ====================

    #[test]
    fn test_group_by_hash() {
        let files = vec![
            hashed("/a", 10, 1),
            hashed("/b", 10, 2),
            hashed("/c", 10, 1),
            hashed("/d", 10, 3),
            make_file("/unhashed", 10),
            hashed("/e", 10, 2),
        ];
        let groups = group_by_hash(10, files);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].hash(), &[1; 32]);
        assert_eq!(groups[0].paths(), vec![PathBuf::from("/a"), PathBuf::from("/c")]);
        assert_eq!(groups[1].hash(), &[2; 32]);
    }
}
