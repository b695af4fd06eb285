use tracing::level_filters::LevelFilter;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Installs the global tracing subscriber from the resolved logging
/// configuration. Unknown levels and formats fall back to `info` / console
/// instead of refusing to start; the resolver never fails and neither does
/// logging setup.
pub fn init_logging(logging_config: &LoggingConfig) {
    let level_filter = match logging_config.level.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        other => {
            eprintln!(
                "Unknown LOG_LEVEL '{other}', using 'info'. Valid values: trace, debug, info, warn, error"
            );
            LevelFilter::INFO
        }
    };

    // Allows env-based overrides on top of the configured default.
    let filter_layer = EnvFilter::default().add_directive(level_filter.into());

    match logging_config.format.trim().to_lowercase().as_str() {
        "json" => {
            // Structured output for log shippers.
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt::layer().json())
                .init();
        }
        _ => {
            // Human-readable console output; also the fallback for unknown formats.
            tracing_subscriber::registry()
                .with(filter_layer)
                .with(fmt::layer().pretty())
                .init();
        }
    }
}
