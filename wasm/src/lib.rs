//! WebAssembly module for the YieldForecast dashboard
//!
//! Provides client-side computation for:
//! - Drawn overlay to GeoJSON conversion
//! - History chart geometry
//! - Notification ages
//! - Form validation before a request is sent

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use shared::chart::{ChartLayout, ChartModel, DateLabel, GridLine, LegendEntry};
use shared::{
    format_relative_age, validate_chat_id, validate_date_range, validate_opacity,
    validate_search_query, validate_zone_name, DateRange, ForecastStatus, Geometry, ImageQuality,
    LatLng, LatLngBounds, StatusOutcome, YieldRecord,
};

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;

fn js_error(context: &str, e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, e))
}

// ============================================================================
// Overlay conversion
// ============================================================================

/// GeoJSON for a drawn rectangle
#[wasm_bindgen]
pub fn rectangle_geojson(south: f64, west: f64, north: f64, east: f64) -> Result<String, JsValue> {
    let bounds = LatLngBounds::new(LatLng::new(south, west), LatLng::new(north, east));
    Geometry::rectangle(&bounds)
        .map(|g| g.to_json())
        .map_err(|e| js_error("Invalid rectangle", e))
}

/// GeoJSON for a drawn polygon; `vertices_json` is `[{lat, lng}, ...]`
#[wasm_bindgen]
pub fn polygon_geojson(vertices_json: &str) -> Result<String, JsValue> {
    let vertices: Vec<LatLng> =
        serde_json::from_str(vertices_json).map_err(|e| js_error("Invalid vertices JSON", e))?;
    Geometry::polygon(&vertices)
        .map(|g| g.to_json())
        .map_err(|e| js_error("Invalid polygon", e))
}

/// Point geometry carrying the circle radius in meters
#[wasm_bindgen]
pub fn circle_geojson(lat: f64, lng: f64, radius_m: f64) -> Result<String, JsValue> {
    Geometry::circle(LatLng::new(lat, lng), radius_m)
        .map(|g| g.to_json())
        .map_err(|e| js_error("Invalid circle", e))
}

// ============================================================================
// Chart geometry
// ============================================================================

#[derive(Serialize)]
struct SeriesFrame {
    label: String,
    color: &'static str,
    points: Vec<(f64, f64)>,
}

/// Everything a canvas needs to draw the history chart
#[derive(Serialize)]
struct ChartFrame {
    backing_width: u32,
    backing_height: u32,
    origin: (f64, f64),
    grid: Vec<GridLine>,
    dates: Vec<DateLabel>,
    legend: Vec<LegendEntry>,
    series: Vec<SeriesFrame>,
}

fn chart_frame_for(records: &[YieldRecord], layout: &ChartLayout) -> Option<ChartFrame> {
    let model = ChartModel::from_records(records)?;
    let (backing_width, backing_height) = layout.backing_size();
    Some(ChartFrame {
        backing_width,
        backing_height,
        origin: layout.origin(),
        grid: layout.grid_lines(&model),
        dates: layout.date_labels(&model),
        legend: layout.legend(&model),
        series: model
            .series
            .iter()
            .map(|s| SeriesFrame {
                label: s.parameter.to_string(),
                color: s.color,
                points: layout.series_points(&model, s),
            })
            .collect(),
    })
}

/// Chart geometry for `records_json`, or `null` when there is nothing to plot
#[wasm_bindgen]
pub fn chart_frame(records_json: &str, width: f64, height: f64, dpr: f64) -> Result<String, JsValue> {
    let records: Vec<YieldRecord> =
        serde_json::from_str(records_json).map_err(|e| js_error("Invalid records JSON", e))?;
    let layout = ChartLayout::new(width, height, dpr);
    serde_json::to_string(&chart_frame_for(&records, &layout))
        .map_err(|e| js_error("Failed to encode chart", e))
}

// ============================================================================
// Notifications and status
// ============================================================================

/// "just now", "5m ago", "3h ago" or "2d ago"
#[wasm_bindgen]
pub fn relative_age(timestamp_ms: f64, now_ms: f64) -> String {
    let at = |ms: f64| DateTime::<Utc>::from_timestamp_millis(ms as i64).unwrap_or_default();
    format_relative_age(at(timestamp_ms), at(now_ms))
}

/// Age of a notification relative to the browser clock
#[wasm_bindgen]
pub fn age_since(timestamp_ms: f64) -> String {
    relative_age(timestamp_ms, js_sys::Date::now())
}

/// CSS class suffix for an acquisition's cloud cover
#[wasm_bindgen]
pub fn image_quality(cloud_coverage: f64) -> String {
    match ImageQuality::from_cloud_coverage(cloud_coverage) {
        ImageQuality::Good => "good",
        ImageQuality::Medium => "medium",
        ImageQuality::Poor => "poor",
    }
    .to_string()
}

/// Classify a status poll: `pending`, `completed`, `failed` or `idle`
#[wasm_bindgen]
pub fn status_outcome(running: bool, message: &str) -> String {
    let status = ForecastStatus {
        running,
        message: message.to_string(),
    };
    match status.outcome() {
        StatusOutcome::Pending => "pending",
        StatusOutcome::Completed => "completed",
        StatusOutcome::Failed(_) => "failed",
        StatusOutcome::Idle => "idle",
    }
    .to_string()
}

// ============================================================================
// Validation
// ============================================================================
// Each returns the message to show, or `undefined` when the input is fine.

#[wasm_bindgen]
pub fn check_zone_name(name: &str) -> Option<String> {
    validate_zone_name(name).err().map(str::to_string)
}

/// Dates are `YYYY-MM-DD`, as date inputs produce them
#[wasm_bindgen]
pub fn check_date_range(start: &str, end: &str) -> Option<String> {
    let parse = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d");
    match (parse(start), parse(end)) {
        (Ok(start), Ok(end)) => validate_date_range(&DateRange { start, end })
            .err()
            .map(str::to_string),
        _ => Some("Please enter valid dates.".to_string()),
    }
}

#[wasm_bindgen]
pub fn check_opacity(opacity: f64) -> Option<String> {
    validate_opacity(opacity).err().map(str::to_string)
}

#[wasm_bindgen]
pub fn check_search_query(query: &str) -> Option<String> {
    validate_search_query(query).err().map(str::to_string)
}

#[wasm_bindgen]
pub fn check_chat_id(chat_id: &str) -> Option<String> {
    validate_chat_id(chat_id).err().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_ring_is_closed() {
        let json = rectangle_geojson(0.0, 0.0, 1.0, 2.0).unwrap();
        let geometry = Geometry::from_json(&json).unwrap();
        let ring = geometry.exterior_ring();
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn test_polygon_from_vertices() {
        let json = polygon_geojson(
            r#"[{"lat": 0, "lng": 0}, {"lat": 0, "lng": 1}, {"lat": 1, "lng": 1}]"#,
        )
        .unwrap();
        assert!(json.contains("\"Polygon\""));
    }

    #[test]
    fn test_circle_keeps_radius() {
        let json = circle_geojson(-1.3, 36.8, 500.0).unwrap();
        let geometry = Geometry::from_json(&json).unwrap();
        assert_eq!(geometry.radius(), Some(500.0));
    }

    #[test]
    fn test_chart_frame_scales_backing_store() {
        let records = r#"[
            {"id": 1, "date": "2024-03-01", "parameter": "NDVI", "indexValue": 0.4},
            {"id": 2, "date": "2024-04-01", "parameter": "NDVI", "indexValue": 0.6}
        ]"#;
        let frame: serde_json::Value =
            serde_json::from_str(&chart_frame(records, 400.0, 200.0, 2.0).unwrap()).unwrap();
        assert_eq!(frame["backing_width"], 800);
        assert_eq!(frame["series"][0]["points"].as_array().unwrap().len(), 2);
        assert_eq!(frame["grid"].as_array().unwrap().len(), 6);

        assert_eq!(chart_frame("[]", 400.0, 200.0, 1.0).unwrap(), "null");
    }

    #[test]
    fn test_relative_age() {
        let now = 1_700_000_000_000.0;
        assert_eq!(relative_age(now - 30_000.0, now), "just now");
        assert_eq!(relative_age(now - 5.0 * 60_000.0, now), "5m ago");
        assert_eq!(relative_age(now - 3.0 * 3_600_000.0, now), "3h ago");
        assert_eq!(relative_age(now - 50.0 * 3_600_000.0, now), "2d ago");
    }

    #[test]
    fn test_status_outcome() {
        assert_eq!(status_outcome(true, "Processing tiles"), "pending");
        assert_eq!(status_outcome(false, "Completed"), "completed");
        assert_eq!(status_outcome(false, "Failed: quota"), "failed");
        assert_eq!(status_outcome(false, "idle"), "idle");
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(check_zone_name("  ").as_deref(), Some("Please enter a Zone Name."));
        assert_eq!(check_zone_name("North Field"), None);
        assert!(check_date_range("2024-06-01", "2024-01-01").is_some());
        assert!(check_date_range("2024-01-01", "2024-06-01").is_none());
        assert!(check_date_range("June", "2024-06-01").is_some());
        assert!(check_opacity(1.5).is_some());
        assert!(check_chat_id("-100123").is_none());
        assert_eq!(image_quality(12.0), "good");
        assert_eq!(image_quality(75.0), "poor");
    }
}
