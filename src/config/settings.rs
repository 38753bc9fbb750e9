//! Engine settings
//!
//! Persisted as JSON next to the rate feed. Every field has a default, so a
//! partial or missing file still loads.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::paths::TallyPaths;
use crate::currency::{CsvRateFile, JsonRateFile, RateSource};
use crate::error::{EngineError, EngineResult};
use crate::models::CurrencyCode;
use crate::storage::file_io::write_json_atomic;

/// Format of the rate feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RateSourceKind {
    /// JSON document with currency records and samples (default)
    #[default]
    Json,
    /// Flat `date,currency,value` rows
    Csv,
}

impl RateSourceKind {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

/// User settings for tally-core
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Currency given to newly created accounts
    #[serde(default = "default_currency")]
    pub default_currency: String,

    /// Format of the rate feed
    #[serde(default)]
    pub rate_source: RateSourceKind,

    /// Rate feed location; defaults to `rates.<ext>` in the base directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rates_file: Option<PathBuf>,

    /// `tracing` filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_currency() -> String {
    "USD".to_string()
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            default_currency: default_currency(),
            rate_source: RateSourceKind::default(),
            rates_file: None,
            log_filter: default_log_filter(),
        }
    }
}

impl Settings {
    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &TallyPaths) -> EngineResult<Self> {
        let settings_path = paths.settings_file();

        if !settings_path.exists() {
            // Not saved here; the caller decides when to persist
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(&settings_path)
            .map_err(|e| EngineError::Io(format!("Failed to read settings file: {}", e)))?;

        let settings: Settings = serde_json::from_str(&contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse settings file: {}", e)))?;

        debug!(path = %settings_path.display(), "settings loaded");
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self, paths: &TallyPaths) -> EngineResult<()> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    /// The configured default currency, canonicalised
    pub fn default_currency_code(&self) -> EngineResult<CurrencyCode> {
        CurrencyCode::parse(&self.default_currency).map_err(|e| {
            EngineError::Config(format!(
                "Invalid default currency '{}': {}",
                self.default_currency, e
            ))
        })
    }

    /// Path of the rate feed
    pub fn rates_path(&self, paths: &TallyPaths) -> PathBuf {
        self.rates_file
            .clone()
            .unwrap_or_else(|| paths.rates_file(self.rate_source))
    }

    /// Rate source matching the configured format and location
    pub fn rate_source(&self, paths: &TallyPaths) -> Box<dyn RateSource> {
        let path = self.rates_path(paths);
        match self.rate_source {
            RateSourceKind::Json => Box::new(JsonRateFile::new(path)),
            RateSourceKind::Csv => Box::new(CsvRateFile::new(path)),
        }
    }
}
