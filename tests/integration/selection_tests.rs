use super::fixtures::{detect, payload, write_file};
use arcdupe::scanner::FileEntry;
use arcdupe::selection::{
    Composite, NewestByModification, OldestByCreation, SelectionError, SelectionStrategy,
    ShortestName, StrategyKind,
};
use filetime::{set_file_mtime, FileTime};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

#[test]
fn test_newest_modification_wins() {
    let dir = tempdir().unwrap();
    let content = payload("timed");
    let t1 = write_file(dir.path(), "first.txt", &content);
    let t3 = write_file(dir.path(), "third.txt", &content);
    let t2 = write_file(dir.path(), "second.txt", &content);
    set_file_mtime(&t1, FileTime::from_unix_time(1_000_000, 0)).unwrap();
    set_file_mtime(&t2, FileTime::from_unix_time(2_000_000, 0)).unwrap();
    set_file_mtime(&t3, FileTime::from_unix_time(3_000_000, 0)).unwrap();

    let (groups, _) = detect(&[dir.path()], false);
    assert_eq!(groups.len(), 1);

    let keeper = NewestByModification.select(&groups[0]).unwrap();
    assert_eq!(keeper.path, t3);
}

#[test]
fn test_selection_is_deterministic() {
    let dir = tempdir().unwrap();
    let content = payload("stable");
    for name in ["b.txt", "a.txt", "c.txt"] {
        write_file(dir.path(), name, &content);
    }
    let (groups, _) = detect(&[dir.path()], false);

    for kind in [
        StrategyKind::Oldest,
        StrategyKind::Newest,
        StrategyKind::Resolution,
        StrategyKind::ShortestName,
    ] {
        let strategy = kind.build();
        let first = strategy.select(&groups[0]).unwrap();
        for _ in 0..5 {
            assert_eq!(strategy.select(&groups[0]).unwrap().path, first.path);
        }
    }
}

#[test]
fn test_empty_input_is_rejected() {
    assert_eq!(ShortestName.select_from(&[]), Err(SelectionError::EmptyGroup));
    assert_eq!(OldestByCreation.select_from(&[]), Err(SelectionError::EmptyGroup));
}

#[test]
fn test_composite_only_first_strategy_decides_by_default() {
    let early = SystemTime::UNIX_EPOCH + Duration::from_secs(10);
    let late = SystemTime::UNIX_EPOCH + Duration::from_secs(20);
    let files = vec![
        FileEntry::new(PathBuf::from("/x/long-name.txt"), 1).with_modified(Some(late)),
        FileEntry::new(PathBuf::from("/x/other-long.txt"), 1).with_modified(Some(late)),
        FileEntry::new(PathBuf::from("/x/s.txt"), 1).with_modified(Some(early)),
    ];

    let faithful = Composite::new(vec![Box::new(NewestByModification), Box::new(ShortestName)]);
    assert_eq!(faithful.select_from(&files).unwrap(), 0);

    let narrowing = Composite::new(vec![Box::new(ShortestName), Box::new(NewestByModification)])
        .with_narrow_ties(true);
    assert_eq!(narrowing.select_from(&files).unwrap(), 2);
}

#[test]
fn test_composite_narrowing_breaks_ties() {
    let stamp = SystemTime::UNIX_EPOCH + Duration::from_secs(5);
    let files = vec![
        FileEntry::new(PathBuf::from("/x/longer.txt"), 1).with_modified(Some(stamp)),
        FileEntry::new(PathBuf::from("/x/a.txt"), 1).with_modified(Some(stamp)),
    ];

    let faithful = Composite::new(vec![Box::new(NewestByModification), Box::new(ShortestName)]);
    assert_eq!(faithful.select_from(&files).unwrap(), 0);

    let narrowing = faithful.with_narrow_ties(true);
    assert_eq!(narrowing.select_from(&files).unwrap(), 1);
}
