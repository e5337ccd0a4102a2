use super::fixtures::{detect, payload, write_file, write_zip, HoldingRemover};
use arcdupe::actions::{filtered_output_dir, BackupRef, Resolver};
use arcdupe::archive::ZipStreamReader;
use arcdupe::backup::BackupStore;
use arcdupe::selection::ShortestName;
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn test_same_archive_duplicates_write_filtered_copy() {
    let dir = tempdir().unwrap();
    let holding = tempdir().unwrap();
    let content = payload("inside");
    let archive = dir.path().join("bundle.zip");
    write_zip(
        &archive,
        &[
            ("keep.txt", content.as_str()),
            ("dup/copy-of-keep.txt", content.as_str()),
            ("other.txt", "something else"),
        ],
    );

    let (groups, _) = detect(&[dir.path()], true);
    assert_eq!(groups.len(), 1);

    let remover = Arc::new(HoldingRemover::new(holding.path()));
    let resolver = Resolver::new(
        Box::new(ShortestName),
        Arc::new(ZipStreamReader::new()),
        remover.clone(),
    );
    let result = resolver.process(&groups[0], true, None).unwrap();

    assert!(result.is_success(), "{:?}", result.error);
    assert!(result.removed.is_empty());
    assert_eq!(result.backup, BackupRef::ArchiveUntouched);
    assert_eq!(remover.moved_count(), 0);
    assert_eq!(result.kept.unwrap().file_name(), "keep.txt");

    let output = filtered_output_dir(&archive);
    assert_eq!(result.filtered_output.as_deref(), Some(output.as_path()));
    assert_eq!(fs::read_to_string(output.join("keep.txt")).unwrap(), content);
    assert_eq!(
        fs::read_to_string(output.join("other.txt")).unwrap(),
        "something else"
    );
    assert!(!output.join("dup").join("copy-of-keep.txt").exists());
    assert!(archive.exists());
}

#[test]
fn test_filtered_copy_matches_dotted_and_backslash_names() {
    let dir = tempdir().unwrap();
    let holding = tempdir().unwrap();
    let content = payload("dotted");
    let archive = dir.path().join("d.zip");
    write_zip(
        &archive,
        &[
            ("./k.txt", content.as_str()),
            ("./dup-long.txt", content.as_str()),
            ("./notes\\readme.txt", "kept alongside"),
        ],
    );

    let (groups, _) = detect(&[dir.path()], true);
    assert_eq!(groups.len(), 1);

    let resolver = Resolver::new(
        Box::new(ShortestName),
        Arc::new(ZipStreamReader::new()),
        Arc::new(HoldingRemover::new(holding.path())),
    );
    let result = resolver.process(&groups[0], false, None).unwrap();

    assert!(result.is_success(), "{:?}", result.error);
    assert_eq!(result.backup, BackupRef::ArchiveUntouched);
    let output = filtered_output_dir(&archive);
    assert_eq!(fs::read_to_string(output.join("k.txt")).unwrap(), content);
    assert_eq!(
        fs::read_to_string(output.join("notes").join("readme.txt")).unwrap(),
        "kept alongside"
    );
    assert!(!output.join("dup-long.txt").exists());
}

#[test]
fn test_removal_without_backup_leaves_store_empty() {
    let dir = tempdir().unwrap();
    let store_root = tempdir().unwrap();
    let holding = tempdir().unwrap();
    let content = payload("plain");
    write_file(dir.path(), "a.txt", &content);
    write_file(dir.path(), "bb.txt", &content);

    let (groups, _) = detect(&[dir.path()], false);
    let remover = Arc::new(HoldingRemover::new(holding.path()));
    let resolver = Resolver::new(
        Box::new(ShortestName),
        Arc::new(ZipStreamReader::new()),
        remover.clone(),
    )
    .with_backup_store(BackupStore::new(store_root.path()));

    let result = resolver.process(&groups[0], false, None).unwrap();

    assert!(result.is_success());
    assert_eq!(result.backup, BackupRef::None);
    assert_eq!(result.removed.len(), 1);
    assert_eq!(remover.moved_count(), 1);
    assert!(dir.path().join("a.txt").exists());
    assert!(!dir.path().join("bb.txt").exists());
    assert!(!store_root.path().join("metadata").exists());
}

#[test]
fn test_backup_then_restore_removed_duplicate() {
    let dir = tempdir().unwrap();
    let store_root = tempdir().unwrap();
    let holding = tempdir().unwrap();
    let content = payload("restore-me");
    write_file(dir.path(), "k.txt", &content);
    let gone = write_file(dir.path(), "nested/longer.txt", &content);

    let (groups, _) = detect(&[dir.path()], false);
    let store = BackupStore::new(store_root.path());
    let resolver = Resolver::new(
        Box::new(ShortestName),
        Arc::new(ZipStreamReader::new()),
        Arc::new(HoldingRemover::new(holding.path())),
    )
    .with_backup_store(store.clone());

    let result = resolver.process(&groups[0], true, None).unwrap();
    assert!(result.is_success(), "{:?}", result.error);
    assert!(!gone.exists());
    assert_eq!(result.bytes_reclaimed(), content.len() as u64);

    let id = result.backup.id().unwrap().to_string();
    let manifest = store.get(&id).unwrap();
    assert!(manifest.contains(&gone));
    assert_eq!(manifest.file_count, 1);

    let restored = store.restore(&id, None).unwrap();
    assert_eq!(restored, vec![gone.clone()]);
    assert_eq!(fs::read_to_string(&gone).unwrap(), content);
}

#[test]
fn test_loose_keeper_leaves_archive_entries_alone() {
    let dir = tempdir().unwrap();
    let holding = tempdir().unwrap();
    let content = payload("mixed");
    write_file(dir.path(), "a.txt", &content);
    let archive = dir.path().join("bundle.zip");
    write_zip(&archive, &[("inner/longer-name.txt", content.as_str())]);

    let (groups, _) = detect(&[dir.path()], true);
    let remover = Arc::new(HoldingRemover::new(holding.path()));
    let resolver = Resolver::new(
        Box::new(ShortestName),
        Arc::new(ZipStreamReader::new()),
        remover.clone(),
    );

    let result = resolver.process(&groups[0], true, None).unwrap();

    assert!(result.is_success());
    assert_eq!(result.skipped_archive_entries, 1);
    assert_eq!(result.backup, BackupRef::NotNeededForArchiveEntries);
    assert_eq!(remover.moved_count(), 0);
    assert!(archive.exists());
    assert!(!filtered_output_dir(&archive).exists());
}
