use super::fixtures::{payload, write_file};
use arcdupe::cli::Cli;
use arcdupe::error::ExitCode;
use arcdupe::run_app;
use clap::Parser;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// An isolated config file and backup root.
struct AppEnv {
    dir: TempDir,
}

impl AppEnv {
    fn new() -> Self {
        let dir = tempdir().unwrap();
        write_file(dir.path(), "arcdupe.toml", "min_size = 1024\n");
        Self { dir }
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("arcdupe.toml")
    }

    fn backups(&self) -> PathBuf {
        self.dir.path().join("backups")
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<ExitCode> {
        let config = self.config();
        let backups = self.backups();
        let mut argv = vec![
            "arcdupe",
            "--quiet",
            "--config",
            config.to_str().unwrap(),
            "--backup-root",
            backups.to_str().unwrap(),
        ];
        argv.extend_from_slice(args);
        run_app(Cli::try_parse_from(argv).unwrap())
    }
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_scan_reports_duplicates() {
    let env = AppEnv::new();
    let data = tempdir().unwrap();
    write_file(data.path(), "a.txt", &payload("dup"));
    write_file(data.path(), "b.txt", &payload("dup"));

    let code = env.run(&["scan", path_arg(data.path())]).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_scan_without_duplicates() {
    let env = AppEnv::new();
    let data = tempdir().unwrap();
    write_file(data.path(), "a.txt", &payload("one"));
    write_file(data.path(), "b.txt", &payload("other"));

    let code = env.run(&["scan", "--output", "json", path_arg(data.path())]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);
}

#[test]
fn test_dedupe_dry_run_touches_nothing() {
    let env = AppEnv::new();
    let data = tempdir().unwrap();
    let a = write_file(data.path(), "a.txt", &payload("dup"));
    let b = write_file(data.path(), "bb.txt", &payload("dup"));

    let code = env
        .run(&["dedupe", "--dry-run", "-s", "shortest-name", path_arg(data.path())])
        .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(a.exists());
    assert!(b.exists());
    assert!(!env.backups().exists());
}

#[test]
fn test_backup_list_on_empty_store() {
    let env = AppEnv::new();
    let code = env.run(&["backup", "list"]).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_backup_show_unknown_id_fails() {
    let env = AppEnv::new();
    let err = env
        .run(&["backup", "show", "7d444840-9dc0-11d1-b245-5ffdce74fad2"])
        .unwrap_err();
    assert!(format!("{err:#}").contains("Backup not found"));
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[test]
fn test_missing_config_file_is_an_error() {
    let data = tempdir().unwrap();
    let missing = data.path().join("nope.toml");
    let cli = Cli::try_parse_from(["arcdupe", "--config", path_arg(&missing), "backup", "list"])
        .unwrap();
    let err = run_app(cli).unwrap_err();
    assert!(err.to_string().contains("config file not found"));
}
