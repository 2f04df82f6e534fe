//! HTTP handlers for the dashboard API
//!
//! Each handler locks the controller just long enough to run one named
//! operation, sends the backend calls it returns with the lock released, and
//! answers with the resulting state.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use shared::chart::ChartLayout;
use shared::{
    validate_search_query, ForecastFormPatch, IndexParameter, TileLayerState, YieldRecord,
};

use crate::error::{AppError, AppResult};
use crate::map::{NativeShape, ShapeMutation};
use crate::render::{draw_chart, SvgCanvas};
use crate::services::{DashboardSnapshot, Pending};
use crate::AppState;

/// Largest chart accepted, in CSS pixels per side
const MAX_CHART_SIZE: f64 = 4096.0;

// ============================================================================
// State
// ============================================================================

/// Full dashboard state
pub async fn get_state(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.controller.lock().await.snapshot())
}

/// Send an operation's backend calls, then read the state they left behind
async fn settle(state: &AppState, pending: Pending) -> Json<DashboardSnapshot> {
    pending.complete_shared(&state.controller).await;
    Json(state.controller.lock().await.snapshot())
}

// ============================================================================
// Map drawing events
// ============================================================================

pub async fn zone_created(
    State(state): State<AppState>,
    Json(shape): Json<NativeShape>,
) -> Json<DashboardSnapshot> {
    let pending = state.controller.lock().await.shape_created(shape);
    settle(&state, pending).await
}

pub async fn zone_edited(
    State(state): State<AppState>,
    Json(shape): Json<NativeShape>,
) -> Json<DashboardSnapshot> {
    let pending = state.controller.lock().await.shape_edited(shape);
    settle(&state, pending).await
}

/// Vertex, bounds, center or radius change while editing
pub async fn zone_mutated(
    State(state): State<AppState>,
    Json(mutation): Json<ShapeMutation>,
) -> Json<DashboardSnapshot> {
    let pending = state.controller.lock().await.shape_mutated(mutation);
    settle(&state, pending).await
}

pub async fn zone_deleted(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    let mut controller = state.controller.lock().await;
    controller.shape_deleted();
    Json(controller.snapshot())
}

// ============================================================================
// Form, availability and forecast runs
// ============================================================================

pub async fn update_form(
    State(state): State<AppState>,
    Json(patch): Json<ForecastFormPatch>,
) -> Json<DashboardSnapshot> {
    let pending = state.controller.lock().await.update_form(patch);
    settle(&state, pending).await
}

/// Check satellite data availability; also the retry action
pub async fn check_availability(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    let pending = state.controller.lock().await.check_availability();
    settle(&state, pending).await
}

pub async fn run_forecast(State(state): State<AppState>) -> AppResult<Json<DashboardSnapshot>> {
    let pending = state.controller.lock().await.run_forecast()?;
    Ok(settle(&state, pending).await)
}

pub async fn cancel_edit(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    let mut controller = state.controller.lock().await;
    controller.cancel_edit();
    Json(controller.snapshot())
}

// ============================================================================
// Records
// ============================================================================

/// Records in fetch order
pub async fn list_records(State(state): State<AppState>) -> Json<Vec<YieldRecord>> {
    Json(state.controller.lock().await.records().to_vec())
}

pub async fn refresh_records(State(state): State<AppState>) -> Json<Vec<YieldRecord>> {
    let pending = state.controller.lock().await.refresh_records();
    pending.complete_shared(&state.controller).await;
    Json(state.controller.lock().await.records().to_vec())
}

pub async fn select_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DashboardSnapshot>> {
    let pending = state.controller.lock().await.select_record_by_id(id)?;
    Ok(settle(&state, pending).await)
}

#[derive(Debug, Deserialize)]
pub struct DeleteRecordQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteRecordResponse {
    /// Whether a DELETE was sent to the backend
    pub issued: bool,
    pub status_message: String,
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<DeleteRecordQuery>,
) -> Json<DeleteRecordResponse> {
    let pending = state.controller.lock().await.delete_record(id, query.confirm);
    let issued = pending.is_some();
    if let Some(pending) = pending {
        pending.complete_shared(&state.controller).await;
    }
    Json(DeleteRecordResponse {
        issued,
        status_message: state.controller.lock().await.status_message().to_string(),
    })
}

// ============================================================================
// Search
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

pub async fn search_location(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> AppResult<Json<DashboardSnapshot>> {
    validate_search_query(&request.query).map_err(|m| AppError::validation("query", m))?;
    let pending = state.controller.lock().await.search_location(&request.query);
    Ok(settle(&state, pending).await)
}

// ============================================================================
// Tile layers
// ============================================================================

#[derive(Debug, Serialize)]
pub struct LayerResponse {
    pub parameter: IndexParameter,
    pub layer: Option<TileLayerState>,
}

pub async fn toggle_layer(
    State(state): State<AppState>,
    Path(parameter): Path<IndexParameter>,
) -> AppResult<Json<LayerResponse>> {
    let mut controller = state.controller.lock().await;
    controller.toggle_layer(&parameter)?;
    let layer = controller.layers().get(&parameter).cloned();
    Ok(Json(LayerResponse { parameter, layer }))
}

#[derive(Debug, Deserialize)]
pub struct OpacityRequest {
    pub opacity: f64,
}

pub async fn set_layer_opacity(
    State(state): State<AppState>,
    Path(parameter): Path<IndexParameter>,
    Json(request): Json<OpacityRequest>,
) -> AppResult<Json<LayerResponse>> {
    let mut controller = state.controller.lock().await;
    controller.set_layer_opacity(&parameter, request.opacity)?;
    let layer = controller.layers().get(&parameter).cloned();
    Ok(Json(LayerResponse { parameter, layer }))
}

// ============================================================================
// Chart
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub dpr: Option<f64>,
}

/// Line chart of the record list as SVG
pub async fn chart_svg(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> AppResult<impl IntoResponse> {
    let width = query.width.unwrap_or(800.0);
    let height = query.height.unwrap_or(320.0);
    for (field, value) in [("width", width), ("height", height)] {
        if !(value.is_finite() && value > 0.0 && value <= MAX_CHART_SIZE) {
            return Err(AppError::validation(
                field,
                format!("{} must be between 1 and {}", field, MAX_CHART_SIZE),
            ));
        }
    }
    let layout = ChartLayout::new(width, height, query.dpr.unwrap_or(1.0).min(4.0));

    let records = state.controller.lock().await.records().to_vec();
    let mut canvas = SvgCanvas::new();
    draw_chart(&mut canvas, &records, &layout);

    Ok((
        [(header::CONTENT_TYPE, "image/svg+xml")],
        canvas.finish().into_string(),
    ))
}
