//! YieldForecast dashboard server
//!
//! Serves the marketing site and the forecasting dashboard. Forecasts are
//! computed by a remote backend; this crate owns the dashboard state, talks to
//! the backend and the geocoder, and renders pages and the history chart.

use std::sync::Arc;

use axum::Router;
use tokio::sync::{mpsc::UnboundedReceiver, Mutex};
use tokio::task::JoinHandle;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod config;
pub mod error;
pub mod external;
pub mod handlers;
pub mod map;
pub mod render;
pub mod routes;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};

use external::ForecastApiClient;
use services::{DashboardController, PollEvent};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Single writer; held only while an operation or reply is applied,
    /// never across a backend call
    pub controller: Arc<Mutex<DashboardController>>,
    /// Session, login and Telegram calls; shares the controller's cookie store
    pub api: ForecastApiClient,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(controller: DashboardController, api: ForecastApiClient, config: Config) -> Self {
        Self {
            controller: Arc::new(Mutex::new(controller)),
            api,
            config: Arc::new(config),
        }
    }
}

/// Create the application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::page_routes())
        .nest("/api/dashboard", routes::api_routes())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Apply status poller events to the controller as they arrive
pub fn spawn_poll_pump(
    controller: Arc<Mutex<DashboardController>>,
    mut events: UnboundedReceiver<PollEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let pending = controller.lock().await.apply_poll_event(event);
            pending.complete_shared(&controller).await;
        }
        tracing::debug!("Poll event channel closed");
    })
}
