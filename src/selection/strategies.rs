//! Metadata-based keep strategies.

use std::time::SystemTime;

use super::SelectionStrategy;
use crate::scanner::FileEntry;

/// Keep the member created first.
///
/// Members without a creation time are ignored. If none has one, the first
/// member is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct OldestByCreation;

/// Keep the member modified last.
///
/// The first member wins ties. If no member has a modification time, the
/// first member is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewestByModification;

/// Keep the member with the fewest characters in its file name.
///
/// For archive entries the name is the last component of the internal
/// path. The first member wins ties.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShortestName;

/// Indices whose key equals the best one, in encounter order.
///
/// `better(a, b)` is true when `a` strictly beats `b`. Members without a key
/// are skipped; when nobody has one, every index ties.
fn best_indices<K, F, B>(files: &[FileEntry], key: F, better: B) -> Vec<usize>
where
    K: PartialEq + Copy,
    F: Fn(&FileEntry) -> Option<K>,
    B: Fn(K, K) -> bool,
{
    let mut best: Option<K> = None;
    let mut tied = Vec::new();

    for (idx, file) in files.iter().enumerate() {
        let Some(k) = key(file) else {
            continue;
        };
        match best {
            Some(current) if better(k, current) => {
                best = Some(k);
                tied.clear();
                tied.push(idx);
            }
            Some(current) if k == current => tied.push(idx),
            Some(_) => {}
            None => {
                best = Some(k);
                tied.push(idx);
            }
        }
    }

    if tied.is_empty() {
        (0..files.len()).collect()
    } else {
        tied
    }
}

fn created(file: &FileEntry) -> Option<SystemTime> {
    file.created
}

fn modified(file: &FileEntry) -> Option<SystemTime> {
    file.modified
}

fn name_len(file: &FileEntry) -> Option<usize> {
    Some(file.file_name().chars().count())
}

impl SelectionStrategy for OldestByCreation {
    fn name(&self) -> &'static str {
        "oldest-by-creation"
    }

    fn choose(&self, files: &[FileEntry]) -> usize {
        self.tied(files)[0]
    }

    fn tied(&self, files: &[FileEntry]) -> Vec<usize> {
        best_indices(files, created, |a, b| a < b)
    }
}

impl SelectionStrategy for NewestByModification {
    fn name(&self) -> &'static str {
        "newest-by-modification"
    }

    fn choose(&self, files: &[FileEntry]) -> usize {
        self.tied(files)[0]
    }

    fn tied(&self, files: &[FileEntry]) -> Vec<usize> {
        best_indices(files, modified, |a, b| a > b)
    }
}

impl SelectionStrategy for ShortestName {
    fn name(&self) -> &'static str {
        "shortest-name"
    }

    fn choose(&self, files: &[FileEntry]) -> usize {
        self.tied(files)[0]
    }

    fn tied(&self, files: &[FileEntry]) -> Vec<usize> {
        best_indices(files, name_len, |a, b| a < b)
    }
}
