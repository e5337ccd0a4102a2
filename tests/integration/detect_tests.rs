use super::fixtures::{detect, payload, write_file, write_zip};
use arcdupe::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use arcdupe::scanner::FileEntry;
use std::collections::HashSet;
use tempfile::tempdir;

#[test]
fn test_two_duplicates_and_one_distinct_file() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", &payload("same"));
    write_file(dir.path(), "b.txt", &payload("same"));
    write_file(dir.path(), "c.txt", &payload("different"));

    let (groups, summary) = detect(&[dir.path()], false);

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].count(), 2);
    let names: HashSet<String> = groups[0].files().iter().map(FileEntry::file_name).collect();
    assert_eq!(names, HashSet::from(["a.txt".to_string(), "b.txt".to_string()]));
    assert_eq!(summary.duplicate_files, 1);
    assert_eq!(summary.reclaimable_space, groups[0].size());
}

#[test]
fn test_loose_file_and_archive_entry_form_one_group() {
    let dir = tempdir().unwrap();
    let content = payload("shared");
    write_file(dir.path(), "loose.txt", &content);
    write_zip(
        &dir.path().join("bundle.zip"),
        &[("inner/copy.txt", content.as_str()), ("unrelated.txt", "tiny")],
    );

    let (groups, summary) = detect(&[dir.path()], true);

    assert_eq!(groups.len(), 1);
    let group = &groups[0];
    assert_eq!(group.count(), 2);
    assert_eq!(group.files().iter().filter(|f| f.is_in_archive()).count(), 1);
    assert_eq!(group.files().iter().filter(|f| !f.is_in_archive()).count(), 1);

    let inner = group.files().iter().find(|f| f.is_in_archive()).unwrap();
    assert!(inner.path.to_string_lossy().ends_with("bundle.zip:inner/copy.txt"));
    assert_eq!(summary.archives_expanded, 1);
}

#[test]
fn test_archive_entries_ignored_without_archive_support() {
    let dir = tempdir().unwrap();
    let content = payload("shared");
    write_file(dir.path(), "loose.txt", &content);
    write_zip(&dir.path().join("bundle.zip"), &[("copy.txt", content.as_str())]);

    let (groups, summary) = detect(&[dir.path()], false);

    assert!(groups.is_empty());
    assert_eq!(summary.archives_expanded, 0);
}

#[test]
fn test_duplicates_within_one_archive() {
    let dir = tempdir().unwrap();
    let content = payload("twice");
    write_zip(
        &dir.path().join("bundle.zip"),
        &[("a.txt", content.as_str()), ("b/a.txt", content.as_str())],
    );

    let (groups, _) = detect(&[dir.path()], true);

    assert_eq!(groups.len(), 1);
    assert!(groups[0].files().iter().all(FileEntry::is_in_archive));
}

#[test]
fn test_group_invariants_across_directories() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    for (dir, prefix) in [(&first, "x"), (&second, "y")] {
        write_file(dir.path(), &format!("{prefix}-one.txt"), &payload("one"));
        write_file(dir.path(), &format!("{prefix}-two.txt"), &payload("two-two"));
        write_file(dir.path(), &format!("{prefix}-unique.txt"), &payload(prefix));
    }

    let (groups, _) = detect(&[first.path(), second.path()], false);

    assert_eq!(groups.len(), 2);
    let mut seen_hashes = HashSet::new();
    for group in &groups {
        assert!(group.count() >= 2);
        assert!(seen_hashes.insert(*group.hash()));
        for file in group.files() {
            assert_eq!(file.size, group.size());
            assert_eq!(file.hash.as_ref(), Some(group.hash()));
        }
    }
    assert!(groups[0].size() >= groups[1].size());
}

#[test]
fn test_small_files_are_not_reported() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", "short");
    write_file(dir.path(), "b.txt", "short");

    let (groups, summary) = detect(&[dir.path()], false);

    assert!(groups.is_empty());
    assert_eq!(summary.eliminated_by_min_size, 2);
}

#[test]
fn test_archive_support_requires_reader() {
    let finder = DuplicateFinder::new(FinderConfig::default());
    let err = finder.find_duplicates(Vec::new(), true).unwrap_err();
    assert!(matches!(err, FinderError::ArchiveSupportUnavailable));
}
