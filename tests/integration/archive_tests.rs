use super::fixtures::{write_file, write_zip};
use arcdupe::archive::{ArchiveError, ArchiveReader, ExtractedFile, ZipStreamReader};
use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;
use zip::write::FileOptions;

#[test]
fn test_enumerate_skips_directories_and_buffers_content() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("mixed.zip");
    let mut zip = zip::ZipWriter::new(File::create(&archive).unwrap());
    zip.add_directory("docs/", FileOptions::default()).unwrap();
    zip.start_file("docs/readme.md", FileOptions::default()).unwrap();
    zip.write_all(b"# readme").unwrap();
    zip.start_file("top.txt", FileOptions::default()).unwrap();
    zip.write_all(b"top level").unwrap();
    zip.finish().unwrap();

    let entries = ZipStreamReader::new().with_chunk_size(3).enumerate(&archive).unwrap();

    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["docs/readme.md", "top.txt"]);
    assert_eq!(entries[0].size, 8);
    assert_eq!(entries[0].content.bytes(), b"# readme");
    assert_eq!(entries[1].content.bytes(), b"top level");
}

#[test]
fn test_extension_filter() {
    let dir = tempdir().unwrap();
    let archive = dir.path().join("pics.zip");
    write_zip(
        &archive,
        &[("a.JPG", "jpeg bytes"), ("b.png", "png bytes"), ("notes.txt", "text")],
    );

    let entries = ZipStreamReader::new()
        .with_extensions([".jpg", "png"])
        .enumerate(&archive)
        .unwrap();

    let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["a.JPG", "b.png"]);
}

#[test]
fn test_extract_all_recreates_layout() {
    let dir = tempdir().unwrap();
    let target = tempdir().unwrap();
    let archive = dir.path().join("tree.zip");
    write_zip(&archive, &[("a/b/c.txt", "deep"), ("root.txt", "shallow")]);

    let written = ZipStreamReader::new()
        .extract_all(&archive, target.path())
        .unwrap();

    assert_eq!(
        written,
        vec![
            ExtractedFile {
                name: "a/b/c.txt".to_string(),
                path: target.path().join("a").join("b").join("c.txt"),
            },
            ExtractedFile {
                name: "root.txt".to_string(),
                path: target.path().join("root.txt"),
            },
        ]
    );
    assert_eq!(fs::read_to_string(target.path().join("a/b/c.txt")).unwrap(), "deep");
}

#[test]
fn test_missing_and_invalid_archives() {
    let dir = tempdir().unwrap();
    let reader = ZipStreamReader::new();

    let missing = dir.path().join("absent.zip");
    assert!(matches!(
        reader.enumerate(&missing),
        Err(ArchiveError::NotFound(_))
    ));
    assert!(matches!(
        reader.enumerate(dir.path()),
        Err(ArchiveError::NotAFile(_))
    ));

    let bogus = write_file(dir.path(), "bogus.zip", "this is plainly not a zip archive");
    assert!(matches!(
        reader.enumerate(&bogus),
        Err(ArchiveError::Unsupported { .. })
    ));
}
