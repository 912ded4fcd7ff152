// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::application::clock::SystemClock;
use crate::application::room_chart_controller::RoomChartController;
use crate::domain::dashboard::RefreshSettings;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::http_sensor_api::HttpSensorApi;
use crate::infrastructure::retained_charts::RetainedCharts;
use crate::infrastructure::theme_file::FileThemeStore;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_dashboard_config().context("Failed to load dashboard configuration")?;

    // Create adapters (infrastructure layer)
    let base_url = config.api.base_url();
    let api = Arc::new(HttpSensorApi::new(
        &base_url,
        Duration::from_secs(config.api.timeout_secs),
    )?);
    let charts = RetainedCharts::new();
    let themes = Arc::new(FileThemeStore::new(&config.theme.path));

    // Create the controller (application layer)
    let controller = RoomChartController::new(
        api,
        Arc::new(charts.clone()),
        themes,
        Arc::new(SystemClock),
        RefreshSettings::new(config.refresh.auto_update, config.refresh.interval_secs),
    );

    tracing::info!(api = %base_url, "Loading rooms and sensors");
    if let Err(e) = controller.initialize().await {
        // The view stays up and reports the failure until restarted
        tracing::error!(error = %e, "Dashboard initialization failed");
    }

    let state = Arc::new(AppState {
        controller: controller.clone(),
        charts,
    });

    // Build router (presentation layer)
    let app = router(state).layer(TraceLayer::new_for_http());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    tracing::info!(addr = %config.server.bind, "Starting room dashboard");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    controller.dispose();
    Ok(())
}
