//! Amount type for representing values in a given currency
//!
//! Internally stores amounts in minor units (i64) to avoid floating-point
//! drift. The number of minor units per whole unit comes from the
//! currency's exponent, which lives in the registry.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::ops::Neg;

use super::currency::CurrencyCode;
use crate::currency::CurrencyRegistry;
use crate::error::{EngineError, EngineResult};

/// A quantity of minor units in one currency
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    pub units: i64,
    pub currency: CurrencyCode,
}

impl Amount {
    pub fn new(units: i64, currency: CurrencyCode) -> Self {
        Self { units, currency }
    }

    /// Create a zero amount in `currency`
    pub fn zero(currency: CurrencyCode) -> Self {
        Self::new(0, currency)
    }

    pub const fn is_zero(&self) -> bool {
        self.units == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.units > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.units < 0
    }

    /// Get the absolute value
    pub fn abs(&self) -> Self {
        Self::new(self.units.abs(), self.currency.clone())
    }

    /// Add two amounts of the same currency
    pub fn checked_add(&self, other: &Amount) -> EngineResult<Amount> {
        if self.currency != other.currency {
            return Err(EngineError::Validation(format!(
                "Cannot add {} to {}",
                other.currency, self.currency
            )));
        }
        let units = self.units.checked_add(other.units).ok_or_else(|| {
            EngineError::Validation(format!("Amount overflow in {}", self.currency))
        })?;
        Ok(Self::new(units, self.currency.clone()))
    }

    /// Express this amount in `target` using the rate in effect on `date`
    pub fn convert(
        &self,
        registry: &CurrencyRegistry,
        date: NaiveDate,
        target: &CurrencyCode,
    ) -> EngineResult<Amount> {
        registry.convert(self, target, date)
    }

    /// Format with `exponent` fractional digits, e.g. "-12.50 USD"
    pub fn format(&self, exponent: u32) -> String {
        let sign = if self.is_negative() { "-" } else { "" };
        let abs = self.units.unsigned_abs();
        if exponent == 0 {
            return format!("{}{} {}", sign, abs, self.currency);
        }
        let scale = 10_u64.pow(exponent);
        format!(
            "{}{}.{:0width$} {}",
            sign,
            abs / scale,
            abs % scale,
            self.currency,
            width = exponent as usize
        )
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.units, self.currency)
    }
}
