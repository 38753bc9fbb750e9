//! tally-core - in-memory bookkeeping engine
//!
//! Holds the accounts and transactions of one open document and converts
//! amounts between currencies using a dated rate history.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Path resolution and persisted settings
//! - `currency`: Currency registry, cross rates and rate sources
//! - `error`: Custom error types
//! - `logging`: `tracing` subscriber setup for hosts
//! - `models`: Core data models (currencies, amounts, accounts, transactions)
//! - `storage`: Account directory, entry lists, transaction store and `Book`
//!
//! # Example
//!
//! ```rust,ignore
//! use tally_core::config::{Settings, TallyPaths};
//! use tally_core::currency::CurrencyRegistry;
//! use tally_core::storage::Book;
//!
//! let paths = TallyPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! tally_core::logging::init_from_settings(&settings);
//!
//! let mut registry = CurrencyRegistry::new();
//! registry.initialize(settings.rate_source(&paths).as_ref())?;
//!
//! let mut book = Book::from_settings(&settings)?;
//! let checking = book.accounts.create_named("Checking", settings.default_currency_code()?)?;
//! ```

pub mod config;
pub mod currency;
pub mod error;
pub mod logging;
pub mod models;
pub mod storage;

pub use error::{EngineError, EngineResult};
