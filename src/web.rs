use leaveboard::app;
use leaveboard::config::AppConfig;

/// Main entry point for the leave-management web service.
///
/// Loads the configuration file (path from the first command-line argument,
/// `leaveboard.json` by default) and runs the HTTP server until shutdown.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "leaveboard.json".to_string());
    let config = AppConfig::load(&config_path)?;

    app::run(config).await
}
