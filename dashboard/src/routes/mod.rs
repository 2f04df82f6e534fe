//! Route definitions for the YieldForecast dashboard

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Server-rendered pages and the session/contact flow
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::landing_page))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route(
            "/contact",
            get(handlers::contact_page).post(handlers::submit_contact),
        )
        .route("/dashboard", get(handlers::dashboard_page))
        .route("/health", get(handlers::health_check))
}

/// Create dashboard API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/state", get(handlers::get_state))
        // Map drawing events
        .nest("/zone", zone_routes())
        // Form and forecast lifecycle
        .route("/form", patch(handlers::update_form))
        .route("/availability", post(handlers::check_availability))
        .route("/forecast", post(handlers::run_forecast))
        .route("/cancel", post(handlers::cancel_edit))
        .route("/search", post(handlers::search_location))
        // History
        .nest("/records", record_routes())
        .route("/chart.svg", get(handlers::chart_svg))
        // Tile overlays
        .nest("/layers", layer_routes())
        .nest("/notifications", notification_routes())
        .nest("/telegram", telegram_routes())
}

fn zone_routes() -> Router<AppState> {
    Router::new()
        .route("/", delete(handlers::zone_deleted))
        .route("/created", post(handlers::zone_created))
        .route("/edited", post(handlers::zone_edited))
        .route("/mutation", post(handlers::zone_mutated))
}

fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_records))
        .route("/refresh", post(handlers::refresh_records))
        .route("/:id", delete(handlers::delete_record))
        .route("/:id/select", post(handlers::select_record))
}

fn layer_routes() -> Router<AppState> {
    Router::new()
        .route("/:parameter/toggle", post(handlers::toggle_layer))
        .route("/:parameter/opacity", put(handlers::set_layer_opacity))
}

fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_notifications))
        .route("/clear", post(handlers::clear_notifications))
        .route("/:id/dismiss", post(handlers::dismiss_notification))
}

fn telegram_routes() -> Router<AppState> {
    Router::new()
        .route("/settings", get(handlers::get_telegram_settings))
        .route("/enable", post(handlers::enable_telegram))
        .route("/disable", post(handlers::disable_telegram))
        .route("/test", get(handlers::test_telegram))
}
