//! BLAKE3 content hasher with streaming support.
//!
//! # Overview
//!
//! [`Hasher`] computes BLAKE3 hashes by feeding fixed-size chunks into an
//! incremental hasher, so memory use stays flat regardless of file size.
//! Plain files are read from disk; archive-interior entries are read by
//! draining their [`ContentProvider`](super::ContentProvider).

use std::io::Read;
use std::path::Path;

use super::{FileEntry, HashError};

/// BLAKE3 hash output (256 bits).
pub type Hash = [u8; 32];

/// Chunk size for streamed reads (64 KiB).
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Streaming BLAKE3 hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    chunk_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher reading [`CHUNK_SIZE`] bytes at a time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
        }
    }

    /// Use a different read chunk size.
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Hash a file on disk.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read.
    pub fn hash_file(&self, path: &Path) -> Result<Hash, HashError> {
        let file = std::fs::File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.hash_reader(file, path)
    }

    /// Hash everything a reader yields.
    ///
    /// `path` is only used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`HashError::Io`] on read failure.
    pub fn hash_reader<R: Read>(&self, mut reader: R, path: &Path) -> Result<Hash, HashError> {
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HashError::from_io(path, e)),
            };
            hasher.update(&buffer[..n]);
        }

        Ok(*hasher.finalize().as_bytes())
    }

    /// Hash a candidate entry, whichever side of the archive boundary it is on.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the content cannot be read.
    pub fn hash_entry(&self, entry: &FileEntry) -> Result<Hash, HashError> {
        if entry.is_in_archive() {
            let reader = entry.open().map_err(|e| HashError::from_io(&entry.path, e))?;
            self.hash_reader(reader, &entry.path)
        } else {
            self.hash_file(&entry.path)
        }
    }
}

/// Convert a hash to lowercase hex.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from(*hash).to_hex().to_string()
}

/// Parse a 64-character hex string into a hash.
#[must_use]
pub fn hex_to_hash(hex: &str) -> Option<Hash> {
    blake3::Hash::from_hex(hex).ok().map(|h| *h.as_bytes())
}
