use arcdupe::cli::parse_size;
use arcdupe::duplicates::{group_by_hash, group_by_size};
use arcdupe::scanner::{hash_to_hex, hex_to_hash, FileEntry, Hasher};
use arcdupe::selection::StrategyKind;
use proptest::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn entries(sizes: &[u64]) -> Vec<FileEntry> {
    sizes
        .iter()
        .enumerate()
        .map(|(i, &size)| FileEntry::new(PathBuf::from(format!("/fake/path/{i}")), size))
        .collect()
}

proptest! {
    #[test]
    fn test_hash_determinism(content in prop::collection::vec(any::<u8>(), 0..8192)) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bin");
        fs::write(&path, &content).unwrap();

        let hasher = Hasher::new();
        let from_file = hasher.hash_file(&path).unwrap();
        let from_reader = hasher.hash_reader(content.as_slice(), &path).unwrap();
        prop_assert_eq!(from_file, from_reader);
        prop_assert_eq!(from_file, hasher.hash_file(&path).unwrap());
    }

    #[test]
    fn test_hash_independent_of_chunk_size(
        content in prop::collection::vec(any::<u8>(), 0..4096),
        chunk in 1usize..512,
    ) {
        let path = Path::new("<memory>");
        let a = Hasher::new().hash_reader(content.as_slice(), path).unwrap();
        let b = Hasher::new().with_chunk_size(chunk).hash_reader(content.as_slice(), path).unwrap();
        prop_assert_eq!(a, b);
        prop_assert_eq!(hex_to_hash(&hash_to_hex(&a)), Some(a));
    }

    #[test]
    fn test_group_by_size_invariants(sizes in prop::collection::vec(0u64..1000, 0..50)) {
        let input = entries(&sizes);
        let (groups, stats) = group_by_size(input.clone());

        for group in &groups {
            prop_assert!(group.len() >= 2);
            prop_assert!(group.size > 0);
            for file in &group.files {
                prop_assert_eq!(file.size, group.size);
            }
        }
        for pair in groups.windows(2) {
            prop_assert!(pair[0].size > pair[1].size);
        }

        prop_assert_eq!(stats.total_files, input.len());
        let grouped: usize = groups.iter().map(|g| g.len()).sum();
        prop_assert_eq!(stats.potential_duplicates, grouped);
        prop_assert_eq!(
            stats.empty_files + stats.eliminated_unique + stats.potential_duplicates,
            stats.total_files
        );
    }

    #[test]
    fn test_group_by_hash_members_share_hash(tags in prop::collection::vec(0u8..4, 0..30)) {
        let files: Vec<FileEntry> = tags
            .iter()
            .enumerate()
            .map(|(i, &tag)| {
                FileEntry::new(PathBuf::from(format!("/f/{i}")), 10).with_hash([tag; 32])
            })
            .collect();

        let groups = group_by_hash(10, files);

        let mut seen = Vec::new();
        for group in &groups {
            prop_assert!(group.count() >= 2);
            prop_assert!(!seen.contains(group.hash()));
            seen.push(*group.hash());
            let expected = tags.iter().filter(|&&t| [t; 32] == *group.hash()).count();
            prop_assert_eq!(group.count(), expected);
        }
    }

    #[test]
    fn test_strategy_choice_is_stable(
        stamps in prop::collection::vec(0u64..5, 1..12),
        kind_index in 0usize..4,
    ) {
        let kind = [
            StrategyKind::Oldest,
            StrategyKind::Newest,
            StrategyKind::Resolution,
            StrategyKind::ShortestName,
        ][kind_index];
        let files: Vec<FileEntry> = stamps
            .iter()
            .enumerate()
            .map(|(i, &s)| {
                let t = SystemTime::UNIX_EPOCH + Duration::from_secs(s);
                FileEntry::new(PathBuf::from(format!("/dir/{}.txt", "n".repeat(1 + i % 3))), 1)
                    .with_created(Some(t))
                    .with_modified(Some(t))
            })
            .collect();

        let strategy = kind.build();
        let first = strategy.select_from(&files).unwrap();
        prop_assert!(first < files.len());
        prop_assert_eq!(strategy.select_from(&files).unwrap(), first);
    }

    #[test]
    fn test_parse_size_plain_numbers(n in 0u64..1_000_000_000) {
        prop_assert_eq!(parse_size(&n.to_string()), Ok(n));
        prop_assert_eq!(parse_size(&format!("{n}B")), Ok(n));
    }
}
