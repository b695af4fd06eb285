use serde::{Deserialize, Serialize};

/// LoggingConfig controls how we initialize tracing/logging.
///
/// Resolved from `LOG_LEVEL` / `LOG_FORMAT` with console defaults suitable
/// for local development; deployments switch to `json`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,  // e.g. "info", "debug", "warn"
    pub format: String, // e.g. "json", "console"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: "console".to_string(),
        }
    }
}
