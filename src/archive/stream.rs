//! Single-pass ZIP reader.
//!
//! Entries are pulled with [`zip::read::read_zipfile_from_stream`], which
//! decodes one local header at a time from a buffered file handle. Each
//! entry's bytes are drained into memory in `chunk_size` pieces before the
//! next header is requested.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use zip::read::read_zipfile_from_stream;

use super::{ArchiveEntry, ArchiveError, ArchiveReader, ExtractedFile};
use crate::scanner::{normalize_internal_path, BufferedContent, CHUNK_SIZE};

/// Streaming ZIP implementation of [`ArchiveReader`].
#[derive(Debug, Clone)]
pub struct ZipStreamReader {
    chunk_size: usize,
    extensions: Option<Vec<String>>,
}

impl Default for ZipStreamReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ZipStreamReader {
    /// Create a reader using 64 KiB chunks and no extension filter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            extensions: None,
        }
    }

    /// Set the read buffer and drain chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Only emit entries whose extension is in `extensions`.
    ///
    /// Extensions are compared case-insensitively, with or without a
    /// leading dot.
    #[must_use]
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = Some(
            extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        );
        self
    }

    fn accepts(&self, name: &str) -> bool {
        let Some(allowed) = &self.extensions else {
            return true;
        };
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase);
        ext.is_some_and(|e| allowed.iter().any(|a| *a == e))
    }

    fn open_checked(&self, archive: &Path) -> Result<BufReader<File>, ArchiveError> {
        let metadata = fs::metadata(archive).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ArchiveError::NotFound(archive.to_path_buf()),
            _ => ArchiveError::io(archive, e),
        })?;
        if !metadata.is_file() {
            return Err(ArchiveError::NotAFile(archive.to_path_buf()));
        }
        let file = File::open(archive).map_err(|e| ArchiveError::io(archive, e))?;
        Ok(BufReader::with_capacity(self.chunk_size, file))
    }
}

impl ArchiveReader for ZipStreamReader {
    fn enumerate(&self, archive: &Path) -> Result<Vec<ArchiveEntry>, ArchiveError> {
        let mut reader = self.open_checked(archive)?;
        let mut entries = Vec::new();
        let mut damaged = false;

        loop {
            let mut file = match read_zipfile_from_stream(&mut reader) {
                Ok(Some(file)) => file,
                Ok(None) => break,
                Err(e) if damaged => {
                    log::warn!(
                        "Stopping early in {} after a damaged entry: {}",
                        archive.display(),
                        e
                    );
                    break;
                }
                Err(e) => {
                    return Err(ArchiveError::Unsupported {
                        path: archive.to_path_buf(),
                        source: e,
                    })
                }
            };

            let name = normalize_internal_path(file.name());
            if file.is_dir() {
                continue;
            }

            if !self.accepts(&name) {
                log::trace!("Filtered out {}:{}", archive.display(), name);
                if let Err(e) = io::copy(&mut file, &mut io::sink()) {
                    log::warn!("Failed to skip {}:{}: {}", archive.display(), name, e);
                    damaged = true;
                }
                continue;
            }

            let declared = file.size();
            let mut data = Vec::new();
            let drained = match drain_into(&mut file, &mut data, self.chunk_size) {
                Ok(n) => n,
                Err(e) => {
                    log::warn!("Skipping unreadable entry {}:{}: {}", archive.display(), name, e);
                    damaged = true;
                    continue;
                }
            };

            let size = reconcile_size(Some(declared), drained, false);
            log::trace!("Read {}:{} ({} bytes)", archive.display(), name, size);
            entries.push(ArchiveEntry {
                name,
                size,
                content: Arc::new(BufferedContent::new(data)),
            });
        }

        log::debug!("Enumerated {} entries in {}", entries.len(), archive.display());
        Ok(entries)
    }

    fn extract_all(
        &self,
        archive: &Path,
        target_dir: &Path,
    ) -> Result<Vec<ExtractedFile>, ArchiveError> {
        let mut reader = self.open_checked(archive)?;
        fs::create_dir_all(target_dir).map_err(|e| ArchiveError::io(target_dir, e))?;
        let mut written = Vec::new();

        loop {
            let mut file = match read_zipfile_from_stream(&mut reader) {
                Ok(Some(file)) => file,
                Ok(None) => break,
                Err(e) => {
                    return Err(ArchiveError::Unsupported {
                        path: archive.to_path_buf(),
                        source: e,
                    })
                }
            };

            let name = normalize_internal_path(file.name());
            let relative = match file.enclosed_name().and(enclosed_relative(&name)) {
                Some(relative) => relative,
                None if file.is_dir() && name.is_empty() => continue,
                None => {
                    return Err(ArchiveError::UnsafeEntry {
                        archive: archive.to_path_buf(),
                        name: file.name().to_string(),
                    })
                }
            };
            let out_path = target_dir.join(relative);

            if file.is_dir() {
                fs::create_dir_all(&out_path).map_err(|e| ArchiveError::io(&out_path, e))?;
                continue;
            }

            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent).map_err(|e| ArchiveError::io(parent, e))?;
            }
            let mut dest = File::create(&out_path).map_err(|e| ArchiveError::io(&out_path, e))?;
            io::copy(&mut file, &mut dest).map_err(|e| ArchiveError::io(&out_path, e))?;
            written.push(ExtractedFile {
                name,
                path: out_path,
            });
        }

        log::debug!(
            "Extracted {} files from {} to {}",
            written.len(),
            archive.display(),
            target_dir.display()
        );
        Ok(written)
    }
}

/// Relative output path for a normalized entry name.
///
/// `None` for an empty name or one with a `..` component.
fn enclosed_relative(name: &str) -> Option<PathBuf> {
    if name.is_empty() || name.split('/').any(|part| part == "..") {
        return None;
    }
    Some(name.split('/').collect())
}

fn drain_into<R: Read>(reader: &mut R, out: &mut Vec<u8>, chunk_size: usize) -> io::Result<u64> {
    let mut buffer = vec![0u8; chunk_size];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        out.extend_from_slice(&buffer[..n]);
        total += n as u64;
    }
    Ok(total)
}

/// Pick the size to report for an entry.
///
/// Local headers can omit the size or carry a stale one. For files the
/// drained byte count wins whenever it disagrees with the declared value;
/// directories keep whatever was declared.
#[must_use]
pub fn reconcile_size(declared: Option<u64>, drained: u64, is_dir: bool) -> u64 {
    if is_dir {
        return declared.unwrap_or(0);
    }
    match declared {
        Some(size) if size == drained => size,
        Some(size) => {
            log::debug!("Declared size {} differs from {} drained bytes", size, drained);
            drained
        }
        None => drained,
    }
}
