//! `serve` command: run the chat-history API server

use crate::config::Config;
use crate::error::Result;
use crate::server::{self, AppState, StaticSessionProvider};
use crate::storage::SqliteStorage;
use std::sync::Arc;

/// Serve the chat-history API until interrupted
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `bind_override` - Optional bind address from the CLI
pub async fn run_server(config: Config, bind_override: Option<String>) -> Result<()> {
    #[cfg(feature = "prometheus")]
    install_metrics_exporter()?;

    let storage = match &config.storage.path {
        Some(path) => SqliteStorage::new_with_path(path)?,
        None => SqliteStorage::new()?,
    };

    if config.server.sessions.is_empty() {
        tracing::warn!("No session tokens configured; every request will be rejected with 401");
    }

    let state = AppState {
        storage: Arc::new(storage),
        sessions: Arc::new(StaticSessionProvider::new(config.server.sessions.clone())),
        default_limit: config.pagination.default_limit,
        max_limit: config.pagination.max_limit,
    };

    let bind = bind_override.unwrap_or(config.server.bind);
    server::run(&bind, state).await
}

#[cfg(feature = "prometheus")]
fn install_metrics_exporter() -> Result<()> {
    use crate::error::BackchatError;
    use metrics_exporter_prometheus::PrometheusBuilder;

    PrometheusBuilder::new().install().map_err(|e| {
        BackchatError::Config(format!("Failed to install Prometheus exporter: {}", e))
    })?;

    Ok(())
}
