//! Configuration module for tally-core
//!
//! - `paths`: XDG-style resolution of the data directory
//! - `settings`: persisted engine preferences (default currency, rate feed)

pub mod paths;
pub mod settings;

pub use paths::TallyPaths;
pub use settings::{RateSourceKind, Settings};
