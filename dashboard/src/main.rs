//! YieldForecast dashboard - server binary

use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yf_dashboard::{
    create_app,
    external::{ForecastApiClient, NominatimClient},
    services::{ControllerSettings, DashboardController},
    spawn_poll_pump, AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yf_dashboard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting YieldForecast dashboard");
    tracing::info!("Environment: {}", config.environment);
    tracing::info!("Forecast backend: {}", config.api.base_url);

    let api = ForecastApiClient::new(&config.api)?;
    let geocoder = NominatimClient::new(&config.geocoding)?;

    let (mut controller, poll_events) = DashboardController::new(
        Arc::new(api.clone()),
        Arc::new(geocoder),
        ControllerSettings::from_config(&config),
    );
    controller.start().complete(&mut controller).await;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let state = AppState::new(controller, api, config);
    let pump = spawn_poll_pump(Arc::clone(&state.controller), poll_events);

    // Build application
    let app = create_app(state.clone());

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop polling and release map overlays
    state.controller.lock().await.shutdown();
    pump.abort();
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
