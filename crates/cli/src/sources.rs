//! Locating the reference sheets for commands that do not run a full
//! estimate: an estimate config's `[sources]`, a data directory, or the
//! directory from the user settings.

use std::path::{Path, PathBuf};

use clap::Args;
use repairgrid_config::Settings;
use repairgrid_estimator::config::SourcesConfig;
use repairgrid_estimator::ReferenceTables;
use repairgrid_io::{load_reference_tables, CachedSource, FileSource};

use crate::CliError;

#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Estimate config whose [sources] name the sheets
    #[arg(long, short = 'c', conflicts_with = "data_dir")]
    pub config: Option<PathBuf>,

    /// Directory holding paint.csv, labour.csv, tinkering.csv and rnr.csv
    #[arg(long, env = "REPAIRGRID_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

impl SourceArgs {
    pub fn file_source(&self, settings: &Settings) -> Result<FileSource, CliError> {
        if let Some(ref config_path) = self.config {
            let config_str = read_config(config_path)?;
            let sources = SourcesConfig::from_toml(&config_str)?;
            return Ok(FileSource::from_config(&sources, config_base_dir(config_path)));
        }

        let dir = self
            .data_dir
            .clone()
            .or_else(|| settings.data_dir.clone())
            .ok_or_else(|| {
                CliError::args("no reference sheets given").with_hint(
                    "pass --config <estimate.toml> or --data-dir <dir>, or set \"data.directory\" in settings",
                )
            })?;
        if !dir.is_dir() {
            return Err(CliError::args(format!("data directory not found: {}", dir.display())));
        }
        Ok(FileSource::from_dir(&dir))
    }

    pub fn load_tables(&self, settings: &Settings) -> Result<ReferenceTables, CliError> {
        let source = CachedSource::new(self.file_source(settings)?, settings.cache_ttl());
        Ok(load_reference_tables(&source)?)
    }
}

pub fn read_config(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|e| CliError::args(format!("cannot read config {}: {e}", path.display())))
}

/// Relative sheet paths resolve against the config file's directory.
pub fn config_base_dir(config_path: &Path) -> &Path {
    match config_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    }
}
