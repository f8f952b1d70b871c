//! Logging setup.
//!
//! With diagnostics disabled only WARN and ERROR are emitted; enabled, DEBUG
//! and INFO come through as well. `RUST_LOG` still applies per module.

use log::LevelFilter;
use std::sync::atomic::{AtomicBool, Ordering};

static DIAGNOSTICS_ENABLED: AtomicBool = AtomicBool::new(true);

/// Call once at startup.
pub fn init_logging(diagnostics_enabled: bool) {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Debug)
        .filter_module("hyper", LevelFilter::Info)
        .filter_module("reqwest", LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_millis()
        .format_module_path(true)
        .init();

    set_diagnostics_enabled(diagnostics_enabled);
}

pub fn set_diagnostics_enabled(enabled: bool) {
    DIAGNOSTICS_ENABLED.store(enabled, Ordering::SeqCst);

    let level = if enabled {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    log::set_max_level(level);
}

pub fn is_diagnostics_enabled() -> bool {
    DIAGNOSTICS_ENABLED.load(Ordering::SeqCst)
}
