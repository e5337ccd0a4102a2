//! arcdupe - archive-aware duplicate file finder
//!
//! Finds byte-identical files across plain directories and ZIP archives
//! using BLAKE3 content hashing, keeps one copy per group according to a
//! pluggable policy, and removes the rest reversibly after copying them into
//! a content-addressed backup store.
//!
//! # Modules
//!
//! - [`scanner`]: candidate model, directory walking and hashing
//! - [`archive`]: streaming ZIP access
//! - [`duplicates`]: size-then-hash duplicate detection
//! - [`selection`]: keep policies
//! - [`actions`]: removal and group resolution
//! - [`backup`]: restorable backups
//!
//! The remaining modules carry the command-line application.

pub mod actions;
pub mod archive;
pub mod backup;
pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod selection;
pub mod signal;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::actions::{PermanentRemover, Remover, ResolutionResult, Resolver, TrashRemover};
use crate::archive::ZipStreamReader;
use crate::backup::BackupStore;
use crate::cli::{BackupCommand, Cli, Commands, DedupeArgs, OutputFormat, ScanArgs, ScanFilterArgs};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, DuplicateGroup, FinderError, ScanSummary};
use crate::error::ExitCode;
use crate::output::{text, write_json, JsonDedupeOutput, JsonOutput};
use crate::progress::{Progress, ProgressCallback};
use crate::scanner::walker::collect_candidates;
use crate::scanner::WalkerConfig;
use crate::signal::ShutdownHandler;

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error for invalid configuration, an interrupted scan, or a
/// failed backup operation. Per-file failures during a scan or dedupe are
/// reported in the output and reflected in the exit code instead.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(root) = &cli.backup_root {
        config.backup_root.clone_from(root);
    }
    log::debug!("Effective configuration: {:?}", config);

    match cli.command {
        Commands::Scan(args) => {
            let shutdown = signal::install_handler();
            run_scan(&args, &config, &shutdown, cli.quiet)
        }
        Commands::Dedupe(args) => {
            let shutdown = signal::install_handler();
            run_dedupe(&args, &config, &shutdown, cli.quiet)
        }
        Commands::Backup(args) => run_backup(args.action, &config),
    }
}

struct ScanOutcome {
    groups: Vec<DuplicateGroup>,
    summary: ScanSummary,
    walk_errors: usize,
}

impl ScanOutcome {
    fn has_errors(&self) -> bool {
        self.walk_errors > 0 || self.summary.has_errors()
    }
}

fn archive_reader(config: &Config) -> Arc<ZipStreamReader> {
    Arc::new(ZipStreamReader::new().with_chunk_size(config.chunk_size))
}

fn scan(
    filter: &ScanFilterArgs,
    config: &Config,
    shutdown: &ShutdownHandler,
    quiet: bool,
) -> Result<ScanOutcome> {
    let walker_config = WalkerConfig {
        follow_symlinks: filter.follow_symlinks,
        skip_hidden: filter.skip_hidden,
        ignore_patterns: filter.ignore_patterns.clone(),
        ..WalkerConfig::default()
    };
    let (candidates, walk_errors) =
        collect_candidates(&filter.paths, &walker_config, Some(shutdown.get_flag()));
    for err in &walk_errors {
        log::warn!("{}", err);
    }
    if shutdown.is_shutdown_requested() {
        return Err(FinderError::Interrupted.into());
    }

    let progress = Arc::new(Progress::new(quiet));
    let callback: Arc<dyn ProgressCallback> = progress.clone();
    let mut finder_config = config
        .finder_config()
        .with_shutdown_flag(shutdown.get_flag())
        .with_progress_callback(callback);
    if let Some(min_size) = filter.min_size {
        finder_config = finder_config.with_min_size(min_size);
    }
    if let Some(threads) = filter.io_threads {
        finder_config = finder_config.with_io_threads(threads);
    }

    let include_archives = filter.archives || config.include_archives;
    let finder = DuplicateFinder::new(finder_config).with_archive_reader(archive_reader(config));
    let found = finder.find_duplicates(candidates, include_archives);
    progress.finish();
    let (groups, summary) = found.context("duplicate scan failed")?;

    Ok(ScanOutcome {
        groups,
        summary,
        walk_errors: walk_errors.len(),
    })
}

fn run_scan(
    args: &ScanArgs,
    config: &Config,
    shutdown: &ShutdownHandler,
    quiet: bool,
) -> Result<ExitCode> {
    let outcome = scan(&args.filter, config, shutdown, quiet)?;
    let exit_code = if outcome.groups.is_empty() {
        ExitCode::NoDuplicates
    } else if outcome.has_errors() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    };

    let mut stdout = io::stdout().lock();
    match args.output {
        OutputFormat::Text => text::write_groups(&mut stdout, &outcome.groups, &outcome.summary)?,
        OutputFormat::Json => JsonOutput::new(&outcome.groups, &outcome.summary, exit_code)
            .write_to(&mut stdout, true)?,
    }
    stdout.flush()?;
    Ok(exit_code)
}

fn run_dedupe(
    args: &DedupeArgs,
    config: &Config,
    shutdown: &ShutdownHandler,
    quiet: bool,
) -> Result<ExitCode> {
    let create_backup = config.create_backup && !args.no_backup;
    if args.permanent && !create_backup {
        bail!("--permanent removes files for good and needs backups enabled");
    }

    let outcome = scan(&args.filter, config, shutdown, quiet)?;
    let strategy = args.strategy.unwrap_or(config.strategy);
    let remover: Arc<dyn Remover> = if args.permanent {
        Arc::new(PermanentRemover)
    } else {
        Arc::new(TrashRemover)
    };
    let resolver = Resolver::new(strategy.build(), archive_reader(config), remover)
        .with_backup_store(BackupStore::new(&config.backup_root))
        .with_shutdown_flag(shutdown.get_flag());
    log::info!(
        "Resolving {} group(s) with strategy {}, backups {}",
        outcome.groups.len(),
        strategy,
        if create_backup { "on" } else { "off" }
    );

    let results: Vec<ResolutionResult> = if args.dry_run {
        resolver.preview_all(&outcome.groups, create_backup)
    } else {
        resolver.process_all(&outcome.groups, create_backup)
    };

    let exit_code = if outcome.groups.is_empty() {
        ExitCode::NoDuplicates
    } else if !args.dry_run && results.len() < outcome.groups.len() {
        ExitCode::Interrupted
    } else if outcome.has_errors() || results.iter().any(|r| !r.is_success()) {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    };

    let mut stdout = io::stdout().lock();
    match args.output {
        OutputFormat::Text => text::write_resolutions(&mut stdout, &results, args.dry_run)?,
        OutputFormat::Json => JsonDedupeOutput::new(&results, &outcome.summary, exit_code)
            .write_to(&mut stdout, true)?,
    }
    stdout.flush()?;
    Ok(exit_code)
}

fn run_backup(action: BackupCommand, config: &Config) -> Result<ExitCode> {
    let store = BackupStore::new(&config.backup_root);
    let mut stdout = io::stdout().lock();

    match action {
        BackupCommand::List { output } => {
            let backups = store.list().context("failed to list backups")?;
            match output {
                OutputFormat::Text => text::write_backup_list(&mut stdout, &backups)?,
                OutputFormat::Json => write_json(&backups, &mut stdout, true)?,
            }
        }
        BackupCommand::Show { id, output } => {
            let manifest = store
                .get(&id)
                .with_context(|| format!("failed to read backup {id}"))?;
            match output {
                OutputFormat::Text => text::write_manifest(&mut stdout, &manifest)?,
                OutputFormat::Json => write_json(&manifest, &mut stdout, true)?,
            }
        }
        BackupCommand::Restore { id, target } => {
            let restored = store
                .restore(&id, target.as_deref())
                .with_context(|| format!("failed to restore backup {id}"))?;
            writeln!(stdout, "Restored {} file(s) from backup {}", restored.len(), id)?;
        }
        BackupCommand::Delete { id } => {
            store
                .delete(&id)
                .with_context(|| format!("failed to delete backup {id}"))?;
            writeln!(stdout, "Deleted backup {id}")?;
        }
    }

    stdout.flush()?;
    Ok(ExitCode::Success)
}
