//! Shared helpers for the integration tests.

use arcdupe::actions::{DeleteError, DeleteResult, Remover};
use arcdupe::duplicates::{DuplicateFinder, DuplicateGroup, FinderConfig, ScanSummary};
use arcdupe::archive::ZipStreamReader;
use arcdupe::scanner::walker::collect_candidates;
use arcdupe::scanner::WalkerConfig;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use zip::write::FileOptions;

/// Content comfortably above the default minimum size.
pub fn payload(tag: &str) -> String {
    format!("{tag}:").repeat(2048 / (tag.len() + 1) + 1)
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
    for (name, content) in entries {
        zip.start_file(*name, FileOptions::default()).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

/// Walk `roots` and run detection with default settings.
pub fn detect(roots: &[&Path], include_archives: bool) -> (Vec<DuplicateGroup>, ScanSummary) {
    let roots: Vec<PathBuf> = roots.iter().map(|p| p.to_path_buf()).collect();
    let (candidates, errors) = collect_candidates(&roots, &WalkerConfig::default(), None);
    assert!(errors.is_empty(), "walk errors: {errors:?}");

    DuplicateFinder::new(FinderConfig::default())
        .with_archive_reader(Arc::new(ZipStreamReader::new()))
        .find_duplicates(candidates, include_archives)
        .unwrap()
}

/// Moves removed files into a holding directory so tests never touch the
/// real trash.
#[derive(Debug)]
pub struct HoldingRemover {
    holding: PathBuf,
    pub moved: Mutex<Vec<PathBuf>>,
}

impl HoldingRemover {
    pub fn new(holding: &Path) -> Self {
        fs::create_dir_all(holding).unwrap();
        Self {
            holding: holding.to_path_buf(),
            moved: Mutex::new(Vec::new()),
        }
    }

    pub fn moved_count(&self) -> usize {
        self.moved.lock().unwrap().len()
    }
}

impl Remover for HoldingRemover {
    fn remove(&self, path: &Path) -> Result<DeleteResult, DeleteError> {
        let size = fs::metadata(path)
            .map_err(|e| DeleteError::from_io(path, e))?
            .len();
        let index = self.moved.lock().unwrap().len();
        let name = path.file_name().unwrap().to_string_lossy();
        let target = self.holding.join(format!("{index}-{name}"));
        fs::rename(path, &target).map_err(|e| DeleteError::from_io(path, e))?;
        self.moved.lock().unwrap().push(path.to_path_buf());
        Ok(DeleteResult::new(path.to_path_buf(), size, false))
    }
}
