// User settings
// Loaded from ~/.config/repairgrid/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use repairgrid_estimator::config::{DEFAULT_RNR_RATE, DEFAULT_TINKERING_RATE};
use repairgrid_estimator::CategoryRates;

/// Overrides the settings file location (tests, CI, multiple profiles).
pub const SETTINGS_ENV: &str = "REPAIRGRID_SETTINGS";

/// Staleness window for cached sheet reads.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Rates
    #[serde(rename = "rates.tinkering")]
    pub tinkering_rate: f64,

    #[serde(rename = "rates.rnr")]
    pub rnr_rate: f64,

    // Sources
    #[serde(rename = "cache.ttlSeconds")]
    pub cache_ttl_secs: u64,

    /// Directory holding paint.csv, labour.csv, tinkering.csv and rnr.csv
    /// when no estimate config names the sources.
    #[serde(rename = "data.directory", skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tinkering_rate: DEFAULT_TINKERING_RATE,
            rnr_rate: DEFAULT_RNR_RATE,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            data_dir: None,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(SETTINGS_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("repairgrid")
            .join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            let settings = Self::default();
            settings.create_default_file(path);
            return settings;
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                // Strip comments (lines starting with //)
                let cleaned: String = contents
                    .lines()
                    .filter(|line| !line.trim().starts_with("//"))
                    .collect::<Vec<_>>()
                    .join("\n");

                match serde_json::from_str(&cleaned) {
                    Ok(settings) => settings,
                    Err(e) => {
                        log::warn!("error parsing {}: {e}; using default settings", path.display());
                        Self::default()
                    }
                }
            }
            Err(e) => {
                log::warn!("error reading {}: {e}; using default settings", path.display());
                Self::default()
            }
        }
    }

    /// Rates to use when an estimate config has no `[rates]`. A negative or
    /// non-finite value falls back to the built-in default.
    pub fn category_rates(&self) -> CategoryRates {
        CategoryRates {
            tinkering: sane_rate("rates.tinkering", self.tinkering_rate, DEFAULT_TINKERING_RATE),
            rnr: sane_rate("rates.rnr", self.rnr_rate, DEFAULT_RNR_RATE),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Create default settings file with comments
    fn create_default_file(&self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                log::debug!("cannot create config directory {}: {e}", parent.display());
                return;
            }
        }

        let default_config = r#"{
    // Fallback rates: labour base value x rate, for eligible parts
    // without an explicit cost
    "rates.tinkering": 3300,
    "rates.rnr": 3300,

    // Seconds a sheet read is reused before the file is read again
    "cache.ttlSeconds": 300

    // Directory with paint.csv, labour.csv, tinkering.csv, rnr.csv
    // "data.directory": "/path/to/sheets"
}
"#;

        if let Err(e) = fs::write(path, default_config) {
            log::debug!("cannot write default {}: {e}", path.display());
        }
    }
}

fn sane_rate(name: &str, value: f64, default: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        log::warn!("settings {name} = {value} is not a valid rate; using {default}");
        default
    }
}
