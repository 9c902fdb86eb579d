use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::app_state::AppState;
use crate::config::AppConfig;
use crate::error::StartupError;
use crate::{cors, db, routes};

/// Install the Prometheus recorder. Without it the service still runs, just unmeasured.
pub fn install_metrics() -> Option<Arc<PrometheusHandle>> {
    let handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus metrics recorder");
            return None;
        }
    };

    metrics::describe_counter!("auth_registrations_total", "Accounts created");
    metrics::describe_counter!("auth_logins_total", "Login attempts by outcome");
    metrics::describe_counter!(
        "whatsapp_webhook_events_total",
        "WhatsApp webhook deliveries received"
    );
    metrics::describe_counter!(
        "whatsapp_messages_received_total",
        "Inbound WhatsApp messages contained in webhook deliveries"
    );
    metrics::describe_gauge!(
        "lifetime_slots_seeded",
        "Lifetime slot rows inserted by the seeder at startup"
    );

    Some(Arc::new(handle))
}

/// Connect, migrate and seed, then serve until a shutdown signal arrives.
/// Each stage runs only after the previous one succeeded.
pub async fn run(
    config: AppConfig,
    prometheus: Option<Arc<PrometheusHandle>>,
) -> Result<(), StartupError> {
    let addr = config.bind_addr()?;

    let pool = db::init(&config.database_url).await?;
    let state = AppState::from_config(pool, &config);

    let origins = cors::resolve_origins(config.allowed_origins.as_deref());
    let app = routes::router(state, cors::cors_layer(origins), prometheus);

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind {
            addr: addr.clone(),
            source,
        })?;

    tracing::info!(%addr, "ZapManejo backend running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
