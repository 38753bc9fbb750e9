//! Currency model
//!
//! A currency is identified by a short code and carries a validity window
//! with its first and most recent known rates.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EngineError, EngineResult};

/// Longest accepted currency code
pub const CURRENCY_CODE_MAXLEN: usize = 4;

/// Largest accepted number of fractional digits
pub const CURRENCY_MAX_EXPONENT: u32 = 10;

/// Canonical currency code (trimmed, upper-case, 1 to 4 characters)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    /// Parse and canonicalize a currency code
    pub fn parse(s: &str) -> EngineResult<Self> {
        let code = s.trim().to_uppercase();
        let len = code.chars().count();
        if len == 0 {
            return Err(EngineError::Validation(
                "Currency code cannot be empty".into(),
            ));
        }
        if len > CURRENCY_CODE_MAXLEN {
            return Err(EngineError::Validation(format!(
                "Currency code too long: '{}' ({} chars, max {})",
                code, len, CURRENCY_CODE_MAXLEN
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CurrencyCode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

/// A registered currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub code: CurrencyCode,

    /// Number of fractional digits
    pub exponent: u32,

    /// First day rates are known for
    pub start_date: NaiveDate,

    pub start_rate: f64,

    /// Last day rates are known for
    pub stop_date: NaiveDate,

    pub latest_rate: f64,
}

impl Currency {
    pub fn new(
        code: CurrencyCode,
        exponent: u32,
        start_date: NaiveDate,
        start_rate: f64,
        stop_date: NaiveDate,
        latest_rate: f64,
    ) -> Self {
        Self {
            code,
            exponent,
            start_date,
            start_rate,
            stop_date,
            latest_rate,
        }
    }

    /// Validate the currency record
    pub fn validate(&self) -> EngineResult<()> {
        if self.exponent > CURRENCY_MAX_EXPONENT {
            return Err(EngineError::Validation(format!(
                "Currency {} exponent {} exceeds maximum {}",
                self.code, self.exponent, CURRENCY_MAX_EXPONENT
            )));
        }
        if self.stop_date < self.start_date {
            return Err(EngineError::Validation(format!(
                "Currency {} stops ({}) before it starts ({})",
                self.code, self.stop_date, self.start_date
            )));
        }
        Ok(())
    }

    /// Smallest unit count making up one whole unit (10^exponent)
    pub fn unit_scale(&self) -> i64 {
        10_i64.pow(self.exponent)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (exp {})", self.code, self.exponent)
    }
}

/// Value of one unit of `currency` in the pivot currency on `date`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateSample {
    pub date: NaiveDate,
    pub currency: CurrencyCode,
    pub value: f64,
}

impl RateSample {
    pub fn new(date: NaiveDate, currency: CurrencyCode, value: f64) -> Self {
        Self {
            date,
            currency,
            value,
        }
    }
}
