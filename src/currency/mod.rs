//! Currency conversion subsystem
//!
//! - `registry`: the [`CurrencyRegistry`] context holding currencies and
//!   their rate history, with cross-rate resolution and conversion.
//! - `source`: the [`RateSource`] seam and the JSON/CSV file sources.
//!
//! # Example
//!
//! ```rust,ignore
//! use tally_core::currency::{CurrencyRegistry, JsonRateFile};
//!
//! let mut registry = CurrencyRegistry::new();
//! registry.initialize(&JsonRateFile::new(paths.rates_file()))?;
//! let rate = registry.rate_between(date, &usd, &eur)?;
//! ```

mod registry;
mod source;

pub use registry::{CurrencyRegistry, RateLoad};
pub use source::{CsvRateFile, JsonRateFile, RateData, RateSource, DERIVED_EXPONENT};
