use tracing_subscriber::EnvFilter;

use zapmanejo_backend::config::AppConfig;
use zapmanejo_backend::error::StartupError;
use zapmanejo_backend::server;

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Initializing ZapManejo backend");

    if let Err(e) = start().await {
        tracing::error!(category = e.category(), error = %e, "FATAL: startup failed");
        std::process::exit(1);
    }
}

async fn start() -> Result<(), StartupError> {
    // Fails before any network or database work when a required variable is missing.
    let config = AppConfig::from_env()?;

    let prometheus = server::install_metrics();

    server::run(config, prometheus).await
}
