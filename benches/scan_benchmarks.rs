use arcdupe::archive::{ArchiveReader, ZipStreamReader};
use arcdupe::duplicates::{DuplicateFinder, FinderConfig};
use arcdupe::scanner::walker::collect_candidates;
use arcdupe::scanner::{Hasher, Walker, WalkerConfig};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use zip::write::FileOptions;

// Helper to create a test directory with a specific structure
fn setup_test_dir(depth: usize, files_per_dir: usize) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    create_dir_recursive(temp_dir.path().to_path_buf(), depth, files_per_dir);
    temp_dir
}

fn create_dir_recursive(path: PathBuf, depth: usize, files_per_dir: usize) {
    if depth == 0 {
        return;
    }
    fs::create_dir_all(&path).expect("Failed to create dir");

    for i in 0..files_per_dir {
        let content = format!("file {i} at depth {depth} ").repeat(100);
        fs::write(path.join(format!("file_{i}.txt")), content).expect("Failed to write file");
    }

    if depth > 1 {
        for i in 0..2 {
            create_dir_recursive(path.join(format!("dir_{i}")), depth - 1, files_per_dir);
        }
    }
}

// 1. Directory walking
fn bench_walker(c: &mut Criterion) {
    let temp_dir = setup_test_dir(4, 10);
    let config = WalkerConfig::default();

    c.bench_function("walker_150_files", |b| {
        b.iter(|| {
            let walker = Walker::new(temp_dir.path(), config.clone());
            let files: Vec<_> = walker.walk().collect();
            black_box(files);
        })
    });
}

// 2. Content hashing
fn bench_hasher(c: &mut Criterion) {
    let mut group = c.benchmark_group("hasher");
    let hasher = Hasher::new();

    for size_kb in [1, 1024, 10240] {
        let data = vec![b'a'; size_kb * 1024];
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("bench_file.dat");
        fs::write(&file_path, &data).expect("Failed to write bench file");

        group.bench_with_input(format!("blake3_{size_kb}KB"), &file_path, |b, path| {
            b.iter(|| black_box(hasher.hash_file(path).unwrap()));
        });
    }
    group.finish();
}

// 3. Streaming ZIP enumeration
fn bench_archive(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("bench.zip");
    let mut zip = zip::ZipWriter::new(File::create(&archive).unwrap());
    for i in 0..200 {
        zip.start_file(format!("entries/{i}.txt"), FileOptions::default())
            .unwrap();
        zip.write_all(format!("entry {i} ").repeat(200).as_bytes())
            .unwrap();
    }
    zip.finish().unwrap();

    let reader = ZipStreamReader::new();
    c.bench_function("zip_enumerate_200_entries", |b| {
        b.iter(|| black_box(reader.enumerate(&archive).unwrap()));
    });
}

// 4. Full detection pipeline, with and without archive expansion
fn bench_pipeline(c: &mut Criterion) {
    let temp_dir = setup_test_dir(3, 10);
    let src = temp_dir.path().join("file_0.txt");
    for i in 1..10 {
        fs::copy(&src, temp_dir.path().join(format!("dup_{i}.txt")))
            .expect("Failed to copy duplicate");
    }
    let mut zip = zip::ZipWriter::new(File::create(temp_dir.path().join("bundle.zip")).unwrap());
    zip.start_file("inner/file_0.txt", FileOptions::default())
        .unwrap();
    zip.write_all(&fs::read(&src).unwrap()).unwrap();
    zip.finish().unwrap();

    let roots = vec![temp_dir.path().to_path_buf()];
    let finder = DuplicateFinder::new(FinderConfig::default().with_min_size(1))
        .with_archive_reader(Arc::new(ZipStreamReader::new()));

    let mut group = c.benchmark_group("pipeline");
    for include_archives in [false, true] {
        group.bench_function(format!("archives_{include_archives}"), |b| {
            b.iter(|| {
                let (candidates, _) =
                    collect_candidates(&roots, &WalkerConfig::default(), None);
                black_box(finder.find_duplicates(candidates, include_archives).unwrap())
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_walker,
    bench_hasher,
    bench_archive,
    bench_pipeline
);
criterion_main!(benches);
