//! Wiring from global options and configuration to concrete adapters.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use dmi_merge_git::{ConflictStore, GitCliStore, GixStore};
use dmimerge::config::{Config, GitBackend};
use dmimerge::tools::{ProcessCodec, ProcessCompressor};
use tracing::debug;

/// `--git-backend` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    /// Read the index in-process
    Gix,
    /// Shell out to the git CLI
    Cli,
}

impl From<BackendArg> for GitBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Gix => Self::Gix,
            BackendArg::Cli => Self::Cli,
        }
    }
}

/// Global options shared by every subcommand.
pub struct Options {
    pub config: Option<PathBuf>,
    pub git_backend: Option<BackendArg>,
}

impl Options {
    /// Load the explicit config file, or discover one from the current
    /// directory. The `--git-backend` flag wins over the file.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => {
                if !path.is_file() {
                    bail!("config file {} does not exist", path.display());
                }
                debug!(path = %path.display(), "loading config");
                Config::load(path)?
            }
            None => {
                let cwd = std::env::current_dir().context("could not read current directory")?;
                let (config, source) = Config::discover(&cwd)?;
                match source {
                    Some(path) => debug!(path = %path.display(), "discovered config"),
                    None => debug!("no config file found; using defaults"),
                }
                config
            }
        };
        if let Some(arg) = self.git_backend {
            config.git.backend = arg.into();
        }
        Ok(config)
    }
}

/// Open the repository containing the current directory with the
/// configured backend.
pub fn open_store(config: &Config) -> Result<Box<dyn ConflictStore>> {
    let cwd = std::env::current_dir().context("could not read current directory")?;
    open_store_at(config.git.backend, &cwd)
}

fn open_store_at(backend: GitBackend, start: &Path) -> Result<Box<dyn ConflictStore>> {
    let store: Box<dyn ConflictStore> = match backend {
        GitBackend::Gix => Box::new(GixStore::discover(start)?),
        GitBackend::Cli => Box::new(GitCliStore::discover(start)?),
    };
    debug!(backend = %backend, workdir = %store.workdir().display(), "opened repository");
    Ok(store)
}

pub fn codec(config: &Config) -> ProcessCodec {
    ProcessCodec::from_config(&config.codec)
}

/// Primary and secondary compressors, in that order.
pub fn compressors(config: &Config) -> (ProcessCompressor, ProcessCompressor) {
    (
        ProcessCompressor::from_config(&config.optimize.primary),
        ProcessCompressor::from_config(&config.optimize.secondary),
    )
}
