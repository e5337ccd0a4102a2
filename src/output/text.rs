//! Human-readable output.

use std::io::{self, Write};

use bytesize::ByteSize;

use crate::actions::ResolutionResult;
use crate::backup::{BackupManifest, BackupSummary};
use crate::duplicates::{DuplicateGroup, ScanSummary};

/// Write every group followed by a one-line summary.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_groups<W: Write>(
    writer: &mut W,
    groups: &[DuplicateGroup],
    summary: &ScanSummary,
) -> io::Result<()> {
    for (idx, group) in groups.iter().enumerate() {
        writeln!(
            writer,
            "Group {} ({} x {}, hash {})",
            idx + 1,
            group.count(),
            ByteSize::b(group.size()),
            &group.hash_hex()[..16]
        )?;
        for file in group.files() {
            writeln!(writer, "  {}", file.path.display())?;
        }
    }
    write_scan_summary(writer, summary)
}

/// One line describing a scan.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_scan_summary<W: Write>(writer: &mut W, summary: &ScanSummary) -> io::Result<()> {
    writeln!(
        writer,
        "{} duplicate groups, {} duplicate files, {} reclaimable ({} candidates, {} archives, {:.2?})",
        summary.duplicate_groups,
        summary.duplicate_files,
        summary.reclaimable_display(),
        summary.total_candidates,
        summary.archives_expanded,
        summary.scan_duration
    )?;
    for err in &summary.archive_errors {
        writeln!(writer, "  archive skipped: {err}")?;
    }
    for err in &summary.hash_errors {
        writeln!(writer, "  not hashed: {err}")?;
    }
    Ok(())
}

/// Describe what a dedupe run did (or, with `dry_run`, would do).
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_resolutions<W: Write>(
    writer: &mut W,
    results: &[ResolutionResult],
    dry_run: bool,
) -> io::Result<()> {
    let verb = if dry_run { "would remove" } else { "removed" };
    for result in results {
        match &result.kept {
            Some(kept) => writeln!(writer, "keep   {}", kept.path.display())?,
            None => writeln!(writer, "keep   -")?,
        }
        for file in &result.removed {
            writeln!(writer, "  {verb} {}", file.path.display())?;
        }
        if result.skipped_archive_entries > 0 {
            writeln!(
                writer,
                "  left {} archive entries in place",
                result.skipped_archive_entries
            )?;
        }
        if let Some(output) = &result.filtered_output {
            writeln!(writer, "  filtered copy at {}", output.display())?;
        }
        if !dry_run {
            writeln!(writer, "  backup: {}", result.backup)?;
        }
        if let Some(error) = &result.error {
            writeln!(writer, "  error: {error}")?;
        }
    }

    let removed: usize = results.iter().map(|r| r.removed.len()).sum();
    let bytes: u64 = results.iter().map(ResolutionResult::bytes_reclaimed).sum();
    let failed = results.iter().filter(|r| !r.is_success()).count();
    writeln!(
        writer,
        "{} groups, {} {} files, {} reclaimed, {} with errors",
        results.len(),
        verb,
        removed,
        ByteSize::b(bytes),
        failed
    )
}

/// Table of backups, newest first.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_backup_list<W: Write>(writer: &mut W, backups: &[BackupSummary]) -> io::Result<()> {
    if backups.is_empty() {
        return writeln!(writer, "No backups");
    }
    for backup in backups {
        writeln!(
            writer,
            "{}  {}  {:>5} files  {}",
            backup.id,
            backup.created_at.format("%Y-%m-%d %H:%M:%S"),
            backup.file_count,
            ByteSize::b(backup.total_size)
        )?;
    }
    Ok(())
}

/// Every file recorded in one backup.
///
/// # Errors
///
/// Returns any error from the writer.
pub fn write_manifest<W: Write>(writer: &mut W, manifest: &BackupManifest) -> io::Result<()> {
    writeln!(
        writer,
        "Backup {} taken {} ({} files, {})",
        manifest.id,
        manifest.created_at.format("%Y-%m-%d %H:%M:%S"),
        manifest.file_count,
        ByteSize::b(manifest.total_size)
    )?;
    for record in &manifest.files {
        writeln!(
            writer,
            "  {} -> {} ({})",
            record.original_path.display(),
            record.stored_name,
            ByteSize::b(record.size)
        )?;
    }
    Ok(())
}
