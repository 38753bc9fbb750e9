//! Currency registry
//!
//! Holds the catalog of currencies and, per currency, a time series of its
//! value in the pivot currency. Cross rates are ratios of two such values.
//! The registry is an explicit context: it starts closed, is opened by
//! [`CurrencyRegistry::initialize`] and closed again by
//! [`CurrencyRegistry::teardown`].

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use super::source::{RateData, RateSource};
use crate::error::{EngineError, EngineResult};
use crate::models::{Amount, Currency, CurrencyCode};

/// Outcome of a successful [`CurrencyRegistry::initialize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLoad {
    /// The source produced data
    Loaded { currencies: usize, samples: usize },
    /// The source was empty; the registry is open but holds nothing new
    NoData,
}

#[derive(Debug, Default)]
struct RegistryState {
    currencies: BTreeMap<CurrencyCode, Currency>,
    /// Value in the pivot currency, one sample per date
    history: HashMap<CurrencyCode, BTreeMap<NaiveDate, f64>>,
}

impl RegistryState {
    fn reference_value(&self, date: NaiveDate, code: &CurrencyCode) -> Option<f64> {
        let series = self.history.get(code)?;
        series
            .range(..=date)
            .next_back()
            .or_else(|| series.range(date..).next())
            .map(|(_, value)| *value)
    }
}

/// Catalog of currencies and their rate history
#[derive(Debug, Default)]
pub struct CurrencyRegistry {
    state: Option<RegistryState>,
}

fn check_value(code: &CurrencyCode, date: NaiveDate, value: f64) -> EngineResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(EngineError::Validation(format!(
            "Invalid rate for {} on {}: {}",
            code, date, value
        )));
    }
    Ok(())
}

impl CurrencyRegistry {
    /// Create a closed registry
    pub fn new() -> Self {
        Self { state: None }
    }

    /// Whether the registry has been initialized and not torn down
    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }

    fn state(&self) -> EngineResult<&RegistryState> {
        self.state.as_ref().ok_or(EngineError::RegistryClosed)
    }

    fn state_mut(&mut self) -> EngineResult<&mut RegistryState> {
        self.state.as_mut().ok_or(EngineError::RegistryClosed)
    }

    /// Open the registry (if closed) and load `source` into it
    ///
    /// The source is validated as a whole before anything is applied: a
    /// malformed source leaves the registry exactly as it was.
    pub fn initialize(&mut self, source: &dyn RateSource) -> EngineResult<RateLoad> {
        let data = source.load().map_err(|e| match e {
            EngineError::Source(_) => e,
            other => EngineError::Source(other.to_string()),
        })?;
        self.validate_source(&data)?;

        let state = self.state.get_or_insert_with(RegistryState::default);
        if data.is_empty() {
            info!("currency registry opened; rate source holds no data");
            return Ok(RateLoad::NoData);
        }

        let RateData {
            currencies,
            samples,
        } = data;
        let loaded = RateLoad::Loaded {
            currencies: currencies.len(),
            samples: samples.len(),
        };
        for currency in currencies {
            state.currencies.insert(currency.code.clone(), currency);
        }
        for sample in samples {
            state
                .history
                .entry(sample.currency)
                .or_default()
                .insert(sample.date, sample.value);
        }

        info!(?loaded, "currency registry initialized");
        Ok(loaded)
    }

    fn validate_source(&self, data: &RateData) -> EngineResult<()> {
        for currency in &data.currencies {
            currency
                .validate()
                .map_err(|e| EngineError::Source(e.to_string()))?;
        }
        for sample in &data.samples {
            let known = data.currencies.iter().any(|c| c.code == sample.currency)
                || self
                    .state
                    .as_ref()
                    .is_some_and(|s| s.currencies.contains_key(&sample.currency));
            if !known {
                return Err(EngineError::Source(format!(
                    "Sample on {} references unknown currency {}",
                    sample.date, sample.currency
                )));
            }
            check_value(&sample.currency, sample.date, sample.value)
                .map_err(|e| EngineError::Source(e.to_string()))?;
        }
        Ok(())
    }

    /// Drop every rate sample, keeping the registered currencies
    pub fn reset_rate_history(&mut self) -> EngineResult<()> {
        let state = self.state_mut()?;
        let dropped: usize = state.history.values().map(BTreeMap::len).sum();
        state.history.clear();
        info!(dropped, "rate history reset");
        Ok(())
    }

    /// Release everything; the registry is closed until re-initialized
    pub fn teardown(&mut self) {
        if self.state.take().is_some() {
            info!("currency registry torn down");
        }
    }

    /// Insert or overwrite the currency with canonical code `code`
    pub fn register(
        &mut self,
        code: &str,
        exponent: u32,
        start_date: NaiveDate,
        start_rate: f64,
        stop_date: NaiveDate,
        latest_rate: f64,
    ) -> EngineResult<&Currency> {
        let code = CurrencyCode::parse(code)?;
        let currency = Currency::new(
            code.clone(),
            exponent,
            start_date,
            start_rate,
            stop_date,
            latest_rate,
        );
        currency.validate()?;
        check_value(&code, start_date, start_rate)?;
        check_value(&code, stop_date, latest_rate)?;

        let state = self.state_mut()?;
        let replaced = state.currencies.insert(code.clone(), currency).is_some();
        debug!(%code, exponent, replaced, "currency registered");
        state
            .currencies
            .get(&code)
            .ok_or_else(|| EngineError::currency_not_found(code.as_str()))
    }

    /// Currency with canonical code equal to `code`, if registered
    pub fn lookup(&self, code: &str) -> EngineResult<Option<&Currency>> {
        let state = self.state()?;
        Ok(CurrencyCode::parse(code)
            .ok()
            .and_then(|code| state.currencies.get(&code)))
    }

    /// Registered currencies, ordered by code
    pub fn currencies(&self) -> EngineResult<impl Iterator<Item = &Currency>> {
        Ok(self.state()?.currencies.values())
    }

    /// Record the value of one unit of `currency` in the pivot currency on
    /// `date`, replacing any sample already on that date
    pub fn set_reference_value(
        &mut self,
        date: NaiveDate,
        currency: &CurrencyCode,
        value: f64,
    ) -> EngineResult<()> {
        check_value(currency, date, value)?;
        let state = self.state_mut()?;
        if !state.currencies.contains_key(currency) {
            return Err(EngineError::currency_not_found(currency.as_str()));
        }
        state
            .history
            .entry(currency.clone())
            .or_default()
            .insert(date, value);
        debug!(%currency, %date, value, "reference value set");
        Ok(())
    }

    /// Value of `currency` in the pivot currency for `date`
    ///
    /// Uses the sample on `date`, else the latest one before it, else the
    /// earliest one after it. `None` when the currency has no samples.
    pub fn reference_value(
        &self,
        date: NaiveDate,
        currency: &CurrencyCode,
    ) -> EngineResult<Option<f64>> {
        Ok(self.state()?.reference_value(date, currency))
    }

    /// Cross rate `value(c2) / value(c1)` on `date`: how many units of `c1`
    /// one unit of `c2` is worth
    ///
    /// A currency against itself is always exactly 1.0.
    pub fn rate_between(
        &self,
        date: NaiveDate,
        c1: &CurrencyCode,
        c2: &CurrencyCode,
    ) -> EngineResult<Option<f64>> {
        let state = self.state()?;
        if c1 == c2 {
            return Ok(Some(1.0));
        }
        let (Some(v1), Some(v2)) = (
            state.reference_value(date, c1),
            state.reference_value(date, c2),
        ) else {
            debug!(%c1, %c2, %date, "no rate available");
            return Ok(None);
        };
        Ok(Some(v2 / v1))
    }

    /// First and last sample dates of `currency`
    pub fn date_range(&self, currency: &CurrencyCode) -> EngineResult<Option<(NaiveDate, NaiveDate)>> {
        let state = self.state()?;
        Ok(state.history.get(currency).and_then(|series| {
            let first = series.keys().next()?;
            let last = series.keys().next_back()?;
            Some((*first, *last))
        }))
    }

    /// Express `amount` in `target` at the rate in effect on `date`,
    /// rounding to the nearest minor unit of `target`
    pub fn convert(
        &self,
        amount: &Amount,
        target: &CurrencyCode,
        date: NaiveDate,
    ) -> EngineResult<Amount> {
        if &amount.currency == target {
            return Ok(amount.clone());
        }
        let state = self.state()?;
        let from = state
            .currencies
            .get(&amount.currency)
            .ok_or_else(|| EngineError::currency_not_found(amount.currency.as_str()))?;
        let to = state
            .currencies
            .get(target)
            .ok_or_else(|| EngineError::currency_not_found(target.as_str()))?;
        let rate = self.rate_between(date, target, &amount.currency)?.ok_or_else(|| {
            EngineError::NoData(format!(
                "No rate between {} and {} on {}",
                amount.currency, target, date
            ))
        })?;

        let whole = amount.units as f64 / from.unit_scale() as f64;
        let converted = (whole * rate * to.unit_scale() as f64).round();
        if !converted.is_finite() || converted.abs() >= i64::MAX as f64 {
            warn!(source = %amount.currency, %target, rate, "conversion out of range");
            return Err(EngineError::Validation(format!(
                "Converted amount out of range: {} {} to {}",
                amount.units, amount.currency, target
            )));
        }
        Ok(Amount::new(converted as i64, target.clone()))
    }
}
