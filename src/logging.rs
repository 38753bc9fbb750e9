//! Tracing/logging initialization.
//!
//! The library only emits `tracing` events; a host that wants to see them
//! calls [`init`] once at startup.

use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered by `RUST_LOG`, or by `default_filter`
/// when `RUST_LOG` is unset or invalid.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// [`init`] with the filter from the engine settings
pub fn init_from_settings(settings: &crate::config::Settings) {
    init(&settings.log_filter);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_noop() {
        init("debug");
        init("not a [valid filter");
        tracing::info!("still logging");
    }
}
