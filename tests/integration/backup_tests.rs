use super::fixtures::{payload, write_file};
use arcdupe::backup::{BackupError, BackupItem, BackupStore};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

fn item(path: &Path) -> BackupItem {
    let size = fs::metadata(path).unwrap().len();
    BackupItem::new(path.to_path_buf(), size)
}

fn sorted_tree(dir: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<(PathBuf, Vec<u8>)> = fs::read_dir(dir)
        .unwrap()
        .map(|e| {
            let path = e.unwrap().path();
            let name = PathBuf::from(path.file_name().unwrap());
            (name, fs::read(&path).unwrap())
        })
        .collect();
    files.sort();
    files
}

#[test]
fn test_unknown_ids_are_not_found() {
    let root = tempdir().unwrap();
    let store = BackupStore::new(root.path());

    for id in ["7d444840-9dc0-11d1-b245-5ffdce74fad2", "../../etc", "garbage"] {
        assert!(matches!(store.restore(id, None), Err(BackupError::NotFound(_))));
        assert!(matches!(store.delete(id), Err(BackupError::NotFound(_))));
        assert!(matches!(store.get(id), Err(BackupError::NotFound(_))));
    }
}

#[test]
fn test_create_get_restore_delete() {
    let root = tempdir().unwrap();
    let data = tempdir().unwrap();
    let first = write_file(data.path(), "one.txt", &payload("one"));
    let second = write_file(data.path(), "deep/two.bin", &payload("two"));
    let store = BackupStore::new(root.path());

    let id = store.create(&[item(&first), item(&second)]).unwrap();
    let manifest = store.get(&id).unwrap();
    assert_eq!(manifest.id, id);
    assert_eq!(manifest.file_count, 2);
    assert!(manifest.contains(&first));
    assert!(manifest.contains(&second));
    assert_eq!(
        manifest.total_size,
        (payload("one").len() + payload("two").len()) as u64
    );

    fs::remove_file(&first).unwrap();
    fs::remove_dir_all(data.path().join("deep")).unwrap();

    let restored = store.restore(&id, None).unwrap();
    assert_eq!(restored.len(), 2);
    assert_eq!(fs::read_to_string(&first).unwrap(), payload("one"));
    assert_eq!(fs::read_to_string(&second).unwrap(), payload("two"));

    store.delete(&id).unwrap();
    assert!(matches!(store.get(&id), Err(BackupError::NotFound(_))));
    assert!(!store.storage_dir(&id).exists());
    assert!(store.list().unwrap().is_empty());
}

#[test]
fn test_restore_to_targets_is_repeatable() {
    let root = tempdir().unwrap();
    let data = tempdir().unwrap();
    let paths = [
        write_file(data.path(), "a.txt", &payload("a")),
        write_file(data.path(), "sub/b.txt", &payload("b")),
    ];
    let store = BackupStore::new(root.path());
    let items: Vec<BackupItem> = paths.iter().map(|p| item(p)).collect();
    let id = store.create(&items).unwrap();

    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    store.restore(&id, Some(first.path())).unwrap();
    store.restore(&id, Some(second.path())).unwrap();

    let tree = sorted_tree(first.path());
    assert_eq!(tree.len(), 2);
    assert_eq!(tree, sorted_tree(second.path()));
    assert_eq!(tree[0].0, PathBuf::from("a.txt"));
}

#[test]
fn test_list_is_newest_first() {
    let root = tempdir().unwrap();
    let data = tempdir().unwrap();
    let path = write_file(data.path(), "f.txt", &payload("f"));
    let store = BackupStore::new(root.path());

    let older = store.create(&[item(&path)]).unwrap();
    thread::sleep(Duration::from_millis(20));
    let newer = store.create(&[item(&path)]).unwrap();

    let ids: Vec<String> = store.list().unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![newer, older]);
}

#[test]
fn test_missing_sources_are_skipped() {
    let root = tempdir().unwrap();
    let data = tempdir().unwrap();
    let present = write_file(data.path(), "here.txt", &payload("here"));
    let absent = BackupItem::new(data.path().join("gone.txt"), 10);
    let store = BackupStore::new(root.path());

    let id = store.create(&[item(&present), absent]).unwrap();
    let manifest = store.get(&id).unwrap();

    assert_eq!(manifest.file_count, 1);
    assert!(manifest.contains(&present));
}
