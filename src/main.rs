mod app;
mod config;
mod errors;
mod external;
mod logging;
mod models;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::external::gestion_bc_api::GestionBcApi;
use crate::external::metrics_source::MetricsSource;
use crate::logging::{init_logging, LoggingConfig};
use crate::services::metrics_feed_service::FeedRegistry;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env()?;
    tracing::info!(
        "🔗 Metrics source: {} (refresh every {:?})",
        config.api_url,
        config.refresh_interval
    );

    let source: Arc<dyn MetricsSource> =
        Arc::new(GestionBcApi::new(config.api_url.clone(), config.api_token.clone()));
    let feeds = FeedRegistry::new(source, config.refresh_interval, config.feed_idle_ttl);
    let sweeper = feeds.spawn_idle_sweeper();

    let state = AppState {
        feeds: feeds.clone(),
    };
    let cors = app::cors_layer(config.cors_allowed_origin.as_deref())?;
    let app = app::create_app(state, cors);

    let listener = TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("🚀 bc-dashboard running at http://{}/", config.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    feeds.shutdown_all();
    if let Err(e) = sweeper.await {
        tracing::error!("Idle feed sweeper panicked: {}", e);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
