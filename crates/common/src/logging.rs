use std::str::FromStr;

use error_stack::{Report, ResultExt};
use log::LevelFilter;

use crate::error::AdapterError;
use crate::settings::Logging;

/// Resolve the configured level name, falling back to `Info` for unknown names.
#[must_use]
pub fn level_filter(config: &Logging) -> LevelFilter {
    LevelFilter::from_str(config.level.trim()).unwrap_or_else(|_| {
        log::warn!("Unknown log level '{}', using info", config.level);
        LevelFilter::Info
    })
}

/// Initialize logging for the host process.
/// Should be called once at startup, before any adapter entry point.
///
/// # Errors
///
/// Returns [`AdapterError::Configuration`] if a global logger is already set.
pub fn init_logger(config: &Logging) -> Result<(), Report<AdapterError>> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}  {} {}",
                chrono::Local::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
                record.level(),
                message
            ))
        })
        .level(level_filter(config))
        .chain(std::io::stdout())
        .apply()
        .change_context(AdapterError::Configuration {
            message: "Failed to initialize logger".to_string(),
        })
}

/// Log level helper to determine if debug logging is enabled
#[must_use]
pub fn is_debug_enabled() -> bool {
    log::log_enabled!(log::Level::Debug)
}
