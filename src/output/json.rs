//! JSON output for scan and dedupe results.
//!
//! # Scan schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "hash": "abc123...",
//!       "size": 1024,
//!       "files": ["/path/a.txt", "/path/photos.zip:b.txt"],
//!       "archive_entries": 1
//!     }
//!   ],
//!   "summary": {
//!     "total_candidates": 100,
//!     "archives_expanded": 2,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 10,
//!     "reclaimable_space": 51200,
//!     "scan_duration_ms": 1234,
//!     "exit_code": 0,
//!     "exit_code_name": "AD000"
//!   }
//! }
//! ```
//!
//! Dedupe output replaces `duplicates` with `resolutions`, one per group.

use std::io::Write;

use serde::Serialize;

use crate::actions::ResolutionResult;
use crate::duplicates::{DuplicateGroup, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// BLAKE3 hash as hexadecimal string (64 characters)
    pub hash: String,
    /// File size in bytes
    pub size: u64,
    /// Display paths of every member
    pub files: Vec<String>,
    /// How many members live inside archives
    pub archive_entries: usize,
}

impl From<&DuplicateGroup> for JsonDuplicateGroup {
    fn from(group: &DuplicateGroup) -> Self {
        Self {
            hash: group.hash_hex(),
            size: group.size(),
            files: group
                .files()
                .iter()
                .map(|f| f.path.to_string_lossy().into_owned())
                .collect(),
            archive_entries: group.files().iter().filter(|f| f.is_in_archive()).count(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Candidates handed to the finder
    pub total_candidates: usize,
    /// Archives expanded into entries
    pub archives_expanded: usize,
    /// Entries read out of archives
    pub archive_entries: usize,
    /// Archives that could not be read
    pub archive_errors: Vec<String>,
    /// Entries dropped for being smaller than the minimum size
    pub eliminated_by_min_size: usize,
    /// Entries dropped for having a unique size
    pub eliminated_by_size: usize,
    /// Entries that were hashed
    pub hashed_entries: usize,
    /// Entries that could not be hashed
    pub hash_errors: Vec<String>,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Duplicate files, excluding one copy per group
    pub duplicate_files: usize,
    /// Bytes reclaimable by keeping one copy per group
    pub reclaimable_space: u64,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "AD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a [`ScanSummary`] and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_candidates: summary.total_candidates,
            archives_expanded: summary.archives_expanded,
            archive_entries: summary.archive_entries,
            archive_errors: summary.archive_errors.iter().map(ToString::to_string).collect(),
            eliminated_by_min_size: summary.eliminated_by_min_size,
            eliminated_by_size: summary.eliminated_by_size,
            hashed_entries: summary.hashed_entries,
            hash_errors: summary.hash_errors.iter().map(ToString::to_string).collect(),
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            scan_duration_ms: u64::try_from(summary.scan_duration.as_millis()).unwrap_or(u64::MAX),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// One resolved group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonResolution {
    /// Display path of the kept member
    pub kept: Option<String>,
    /// Display paths of removed members
    pub removed: Vec<String>,
    /// Backup id or outcome
    pub backup: String,
    /// Archive entries left in place
    pub skipped_archive_entries: usize,
    /// Filtered archive extraction, if one was written
    pub filtered_output: Option<String>,
    /// Failures, joined with `"; "`
    pub error: Option<String>,
}

impl From<&ResolutionResult> for JsonResolution {
    fn from(result: &ResolutionResult) -> Self {
        Self {
            kept: result
                .kept
                .as_ref()
                .map(|k| k.path.to_string_lossy().into_owned()),
            removed: result
                .removed
                .iter()
                .map(|f| f.path.to_string_lossy().into_owned())
                .collect(),
            backup: result.backup.to_string(),
            skipped_archive_entries: result.skipped_archive_entries,
            filtered_output: result
                .filtered_output
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            error: result.error.clone(),
        }
    }
}

/// Complete JSON output of a scan.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// List of duplicate groups
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Create the output from duplicate groups, summary and exit code.
    ///
    /// ```
    /// use arcdupe::duplicates::ScanSummary;
    /// use arcdupe::error::ExitCode;
    /// use arcdupe::output::json::JsonOutput;
    ///
    /// let output = JsonOutput::new(&[], &ScanSummary::default(), ExitCode::NoDuplicates);
    /// assert!(output.to_json().unwrap().starts_with('{'));
    /// ```
    #[must_use]
    pub fn new(groups: &[DuplicateGroup], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            duplicates: groups.iter().map(JsonDuplicateGroup::from).collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Write pretty or compact JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        write_json(self, writer, pretty)
    }
}

/// Complete JSON output of a dedupe run.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDedupeOutput {
    /// One entry per processed group
    pub resolutions: Vec<JsonResolution>,
    /// Files removed across all groups
    pub removed_files: usize,
    /// Bytes freed across all groups
    pub bytes_reclaimed: u64,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonDedupeOutput {
    /// Create the output from resolution results.
    #[must_use]
    pub fn new(results: &[ResolutionResult], summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            resolutions: results.iter().map(JsonResolution::from).collect(),
            removed_files: results.iter().map(|r| r.removed.len()).sum(),
            bytes_reclaimed: results.iter().map(ResolutionResult::bytes_reclaimed).sum(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
        }
    }

    /// Write pretty or compact JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        write_json(self, writer, pretty)
    }
}

/// Serialize any value as one JSON document plus newline.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<T: Serialize, W: Write>(
    value: &T,
    writer: &mut W,
    pretty: bool,
) -> Result<(), JsonOutputError> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    writer.write_all(json.as_bytes())?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
