//! Rate data sources
//!
//! The registry is fed by anything implementing [`RateSource`]. Two file
//! formats are provided: a JSON document carrying currency records and
//! samples, and a flat CSV feed of `date,currency,value` rows.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::models::{Currency, CurrencyCode, RateSample};
use crate::storage::file_io::read_json;

/// Exponent given to currencies that only appear in a sample feed
pub const DERIVED_EXPONENT: u32 = 2;

/// Producer of currency records and rate samples
pub trait RateSource {
    /// Read the whole source. An absent or empty source yields empty data,
    /// not an error.
    fn load(&self) -> EngineResult<RateData>;
}

/// Currency records and samples, as loaded from a source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RateData {
    #[serde(default)]
    pub currencies: Vec<Currency>,

    #[serde(default)]
    pub samples: Vec<RateSample>,
}

impl RateData {
    pub fn new(currencies: Vec<Currency>, samples: Vec<RateSample>) -> Self {
        Self {
            currencies,
            samples,
        }
    }

    /// Build data from samples alone, deriving one currency record per code:
    /// the validity window spans the first to last sample date and the rates
    /// are the values on those dates.
    pub fn from_samples(samples: Vec<RateSample>) -> Self {
        let mut windows: BTreeMap<&CurrencyCode, ((NaiveDate, f64), (NaiveDate, f64))> =
            BTreeMap::new();
        for sample in &samples {
            let point = (sample.date, sample.value);
            windows
                .entry(&sample.currency)
                .and_modify(|(first, last)| {
                    if point.0 < first.0 {
                        *first = point;
                    }
                    if point.0 >= last.0 {
                        *last = point;
                    }
                })
                .or_insert((point, point));
        }

        let currencies = windows
            .into_iter()
            .map(|(code, ((start_date, start_rate), (stop_date, latest_rate)))| {
                Currency::new(
                    code.clone(),
                    DERIVED_EXPONENT,
                    start_date,
                    start_rate,
                    stop_date,
                    latest_rate,
                )
            })
            .collect();

        Self::new(currencies, samples)
    }

    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty() && self.samples.is_empty()
    }
}

impl RateSource for RateData {
    fn load(&self) -> EngineResult<RateData> {
        Ok(self.clone())
    }
}

/// JSON document with `currencies` and `samples` arrays
#[derive(Debug, Clone)]
pub struct JsonRateFile {
    path: PathBuf,
}

impl JsonRateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RateSource for JsonRateFile {
    fn load(&self) -> EngineResult<RateData> {
        read_json(&self.path).map_err(|e| EngineError::Source(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    currency: String,
    value: f64,
}

/// CSV feed with a `date,currency,value` header, dates as YYYY-MM-DD
#[derive(Debug, Clone)]
pub struct CsvRateFile {
    path: PathBuf,
}

impl CsvRateFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RateSource for CsvRateFile {
    fn load(&self) -> EngineResult<RateData> {
        if !self.path.exists() {
            return Ok(RateData::default());
        }

        let file = File::open(&self.path).map_err(|e| {
            EngineError::Source(format!("Failed to open {}: {}", self.path.display(), e))
        })?;
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut samples = Vec::new();
        for (index, row) in reader.deserialize::<CsvRow>().enumerate() {
            // Header is line 1
            let line = index + 2;
            let row = row.map_err(|e| {
                EngineError::Source(format!("{} line {}: {}", self.path.display(), line, e))
            })?;
            let currency = CurrencyCode::parse(&row.currency).map_err(|e| {
                EngineError::Source(format!("{} line {}: {}", self.path.display(), line, e))
            })?;
            samples.push(RateSample::new(row.date, currency, row.value));
        }

        Ok(RateData::from_samples(samples))
    }
}
