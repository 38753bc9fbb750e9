//! Core data models for tally-core
//!
//! This module contains the data structures of the bookkeeping domain:
//! currencies, amounts, accounts and transactions.

pub mod account;
pub mod amount;
pub mod currency;
pub mod ids;
pub mod transaction;

pub use account::{collation_key, Account, AccountType};
pub use amount::Amount;
pub use currency::{Currency, CurrencyCode, RateSample, CURRENCY_CODE_MAXLEN, CURRENCY_MAX_EXPONENT};
pub use ids::{AccountHandle, TransactionId};
pub use transaction::{Split, Transaction};
