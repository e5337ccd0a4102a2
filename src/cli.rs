//! Command-line interface definitions.
//!
//! # Example
//!
//! ```bash
//! # List duplicates, looking inside ZIP archives too
//! arcdupe scan ~/Downloads ~/Archive --archives
//!
//! # JSON for scripting
//! arcdupe scan ~/Downloads --output json
//!
//! # Remove duplicates, keeping the shortest name, with a backup
//! arcdupe dedupe ~/Downloads --strategy shortest-name
//!
//! # See what would happen
//! arcdupe dedupe ~/Downloads --dry-run
//!
//! # Manage backups
//! arcdupe backup list
//! arcdupe backup restore 3f2c... --target /tmp/restored
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::selection::StrategyKind;

/// Archive-aware duplicate file finder.
///
/// Finds byte-identical files across directories and ZIP archives, keeps one
/// copy per group by a configurable policy, and moves the rest to the trash
/// after backing them up.
#[derive(Debug, Parser)]
#[command(name = "arcdupe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (default: config.toml in the platform config dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Backup store directory (overrides the configuration)
    #[arg(long, value_name = "DIR", global = true)]
    pub backup_root: Option<PathBuf>,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List duplicate groups without changing anything
    Scan(ScanArgs),
    /// Keep one copy per duplicate group and remove the rest
    Dedupe(DedupeArgs),
    /// Inspect, restore or delete backups
    Backup(BackupArgs),
}

/// Candidate selection shared by `scan` and `dedupe`.
#[derive(Debug, Args)]
pub struct ScanFilterArgs {
    /// Files or directories to examine
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Look inside ZIP archives
    #[arg(long)]
    pub archives: bool,

    /// Minimum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Glob patterns to ignore (can be specified multiple times)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Follow symbolic links while walking
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Number of threads for hashing (1 hashes sequentially)
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// What to scan
    #[command(flatten)]
    pub filter: ScanFilterArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the dedupe subcommand.
#[derive(Debug, Args)]
pub struct DedupeArgs {
    /// What to scan
    #[command(flatten)]
    pub filter: ScanFilterArgs,

    /// Which copy to keep
    #[arg(short, long, value_enum)]
    pub strategy: Option<StrategyKind>,

    /// Remove without taking a backup first
    #[arg(long)]
    pub no_backup: bool,

    /// Show what would be kept and removed, change nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Unlink files instead of moving them to the trash
    #[arg(long, conflicts_with = "no_backup")]
    pub permanent: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the backup subcommand.
#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Backup operation
    #[command(subcommand)]
    pub action: BackupCommand,
}

/// Backup operations.
#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// List backups, newest first
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
    /// Show the files recorded in a backup
    Show {
        /// Backup id
        id: String,
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },
    /// Copy a backup's files back
    Restore {
        /// Backup id
        id: String,
        /// Restore flat into this directory instead of the original paths
        #[arg(long, value_name = "DIR")]
        target: Option<PathBuf>,
    },
    /// Delete a backup and its stored files
    Delete {
        /// Backup id
        id: String,
    },
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON for scripting
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// ```
/// use arcdupe::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
