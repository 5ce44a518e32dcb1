pub mod admission; // Emergency admission + consent
pub mod api; // HTTP surface
pub mod config;
pub mod core_state; // Shared collaborators
pub mod db;
pub mod identification; // Identification event log
pub mod ids;
pub mod models;
pub mod opd; // OPD slips + tokens
pub mod pipeline; // Clinical drafts
pub mod registry; // Patient registry
pub mod store; // Record store
pub mod validation;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Start the desk backend and serve until Ctrl-C.
pub async fn run() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env();
    let addr = config.addr;

    // The blocking HTTP client must not be built on an async worker
    let core = tokio::task::spawn_blocking(move || core_state::CoreState::from_config(config))
        .await
        .map_err(|e| format!("Startup task failed: {e}"))?
        .map_err(|e| format!("Failed to initialize: {e}"))?;

    let mut server = api::start_api_server(Arc::new(core), addr).await?;
    tracing::info!(
        addr = %server.session.server_addr,
        session_id = %server.session.session_id,
        "Listening"
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
    }

    server.shutdown();
    server.wait().await;
    Ok(())
}
