use std::process::ExitCode;
use std::sync::Arc;

use stagedoor::config::{validate, AppConfig};
use stagedoor::startup;
use stagedoor::utils::init_logging;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> ExitCode {
    let config = AppConfig::resolve();
    init_logging(&config.logging);

    info!(
        environment = config.environment.as_str(),
        app = %config.app_name,
        "Resolved configuration"
    );

    // Deployed instances must fail loudly on missing credentials; local
    // development is allowed to run without a live backend.
    let report = validate(&config);
    if !report.is_valid {
        for message in &report.errors {
            if config.environment.is_production() {
                error!("{message}");
            } else {
                warn!("{message}");
            }
        }
        if config.environment.is_production() {
            error!("Refusing to start with an invalid production configuration.");
            return ExitCode::FAILURE;
        }
    }

    if let Err(e) = startup::run(Arc::new(config)).await {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
