//! Application configuration.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory, or the file passed
//!    with `--config`
//! 3. `ARCDUPE_*` environment variables (e.g. `ARCDUPE_MIN_SIZE=4096`)
//!
//! Command-line flags are applied on top by the CLI.
//!
//! ```toml
//! backup_root = "/srv/arcdupe/backups"
//! min_size = 4096
//! io_threads = 8
//! include_archives = true
//! strategy = "shortest-name"
//! create_backup = true
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::{FinderConfig, DEFAULT_IO_THREADS, DEFAULT_MIN_SIZE};
use crate::scanner::CHUNK_SIZE;
use crate::selection::StrategyKind;

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "ARCDUPE_";

/// File name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "arcdupe", "arcdupe")
}

/// Default location of the backup store.
#[must_use]
pub fn default_backup_root() -> PathBuf {
    project_dirs()
        .map(|dirs| dirs.data_dir().join("backups"))
        .unwrap_or_else(|| PathBuf::from(".arcdupe").join("backups"))
}

/// Default location of the configuration file.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory of the backup store
    pub backup_root: PathBuf,
    /// Smallest file size considered for duplicates
    pub min_size: u64,
    /// Threads used for hashing within a size group
    pub io_threads: usize,
    /// Read buffer size for files and archive streams
    pub chunk_size: usize,
    /// Look inside ZIP archives by default
    pub include_archives: bool,
    /// Keep policy used by `dedupe`
    pub strategy: StrategyKind,
    /// Back up files before removing them
    pub create_backup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backup_root: default_backup_root(),
            min_size: DEFAULT_MIN_SIZE,
            io_threads: DEFAULT_IO_THREADS,
            chunk_size: CHUNK_SIZE,
            include_archives: false,
            strategy: StrategyKind::default(),
            create_backup: true,
        }
    }
}

impl Config {
    /// Load the layered configuration.
    ///
    /// With `explicit` set, that file must exist and replaces the platform
    /// default file.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit file is missing or any layer holds
    /// a value of the wrong type.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.is_file() {
                    bail!("config file not found: {}", path.display());
                }
                Some(path.to_path_buf())
            }
            None => default_config_path(),
        };
        Self::load_from_path(path.as_deref())
    }

    /// Load defaults, then `path` if it exists, then the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a layer cannot be parsed into [`Config`].
    pub fn load_from_path(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            log::debug!("Reading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        let config: Self = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("chunk_size must be greater than zero");
        }
        Ok(())
    }

    /// Finder settings derived from this configuration.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_min_size(self.min_size)
            .with_io_threads(self.io_threads)
            .with_chunk_size(self.chunk_size)
    }
}
