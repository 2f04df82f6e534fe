//! Forecast backend client tests against an in-process fake backend
//!
//! Each test binds a small axum app to an ephemeral port and checks how the
//! client classifies its replies.

use std::sync::{Arc, Mutex};

use axum::{
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use shared::{
    AvailabilityRequest, ForecastForm, ForecastRunRequest, Geometry, IndexParameter, LatLng,
    LoginForm, StatusOutcome, VisualizationRequest,
};
use tokio::net::TcpListener;
use yf_dashboard::external::forecast_api::INVALID_FORMAT_MESSAGE;
use yf_dashboard::external::{ForecastApiClient, ForecastBackend};
use yf_dashboard::AppError;

// ============================================================================
// Fake backend
// ============================================================================

async fn serve(router: Router) -> ForecastApiClient {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    ForecastApiClient::with_base_url(format!("http://{}", addr)).unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn point() -> Geometry {
    Geometry::point(LatLng::new(-1.3, 36.8))
}

fn availability_request() -> AvailabilityRequest {
    AvailabilityRequest {
        geometry: point(),
        start_date: date("2024-01-01"),
        end_date: date("2024-06-30"),
    }
}

fn visualization_request() -> VisualizationRequest {
    VisualizationRequest {
        geometry: point(),
        start_date: date("2024-01-01"),
        end_date: date("2024-06-30"),
        parameter: IndexParameter::Ndmi,
    }
}

// ============================================================================
// Yield records
// ============================================================================

#[tokio::test]
async fn test_yield_list_decodes_records() {
    let client = serve(Router::new().route(
        "/api/yields",
        get(|| async {
            Json(json!([
                {"id": 1, "location": "North", "date": "2024-05-01", "parameter": "NDVI", "indexValue": 0.61},
                {"id": 2, "location": "South", "date": "not a date", "prediction": 0.4}
            ]))
        }),
    ))
    .await;

    let records = client.list_yields().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].chart_value(), 0.61);
    assert_eq!(records[1].date, None);
    assert_eq!(records[1].parameter_or_default(), IndexParameter::Ndvi);
}

#[tokio::test]
async fn test_yield_list_object_is_invalid_format() {
    let client = serve(Router::new().route(
        "/api/yields",
        get(|| async { Json(json!({"error": "Unauthorized"})) }),
    ))
    .await;

    let result = client.list_yields().await;

    assert!(matches!(result, Err(AppError::Domain(m)) if m == INVALID_FORMAT_MESSAGE));
}

#[tokio::test]
async fn test_yield_list_html_is_parse_error() {
    let client = serve(Router::new().route(
        "/api/yields",
        get(|| async { "<html>Bad Gateway</html>" }),
    ))
    .await;

    let error = client.list_yields().await.unwrap_err();

    assert!(matches!(error, AppError::Parse(_)));
    assert_eq!(error.user_message(), "Error parsing data from server");
}

#[tokio::test]
async fn test_delete_targets_record_id() {
    let deleted = Arc::new(Mutex::new(Vec::new()));
    let seen = deleted.clone();
    let client = serve(Router::new().route(
        "/api/yields/:id",
        delete(move |Path(id): Path<i64>| {
            let seen = seen.clone();
            async move {
                seen.lock().unwrap().push(id);
                StatusCode::NO_CONTENT
            }
        }),
    ))
    .await;

    client.delete_yield(17).await.unwrap();

    assert_eq!(*deleted.lock().unwrap(), vec![17]);
}

// ============================================================================
// Availability and visualization
// ============================================================================

#[tokio::test]
async fn test_availability_error_member_is_domain_error() {
    let client = serve(Router::new().route(
        "/api/forecast/check-availability",
        post(|| async { Json(json!({"error": "Earth Engine quota exceeded"})) }),
    ))
    .await;

    let result = client.check_availability(&availability_request()).await;

    assert!(matches!(result, Err(AppError::Domain(m)) if m == "Earth Engine quota exceeded"));
}

#[tokio::test]
async fn test_availability_request_body() {
    let received = Arc::new(Mutex::new(None));
    let sink = received.clone();
    let client = serve(Router::new().route(
        "/api/forecast/check-availability",
        post(move |Json(body): Json<Value>| {
            let sink = sink.clone();
            async move {
                *sink.lock().unwrap() = Some(body);
                Json(json!({
                    "totalImages": 2,
                    "availableDates": [
                        {"date": "2024-06-01", "cloudCoverage": 4.5, "quality": "good"},
                        {"date": "2024-06-11", "cloudCoverage": 35.0, "quality": "poor"}
                    ],
                    "dateRange": {"start": "2024-06-01", "end": "2024-06-11"}
                }))
            }
        }),
    ))
    .await;

    let availability = client.check_availability(&availability_request()).await.unwrap();

    assert_eq!(availability.total_images, 2);
    let body = received.lock().unwrap().clone().unwrap();
    assert_eq!(body["startDate"], "2024-01-01");
    assert_eq!(body["endDate"], "2024-06-30");
    assert_eq!(body["geometry"]["type"], "Point");
}

#[tokio::test]
async fn test_visualization_tile_url() {
    let client = serve(Router::new().route(
        "/api/forecast/visualization",
        post(|Json(body): Json<Value>| async move {
            match body["parameter"].as_str() {
                Some("NDMI") => Json(json!({"tile_url": "https://tiles/ndmi/{z}/{x}/{y}"})),
                _ => Json(json!({"tile_url": ""})),
            }
        }),
    ))
    .await;

    let url = client.visualization(&visualization_request()).await.unwrap();
    assert_eq!(url.as_deref(), Some("https://tiles/ndmi/{z}/{x}/{y}"));

    let mut request = visualization_request();
    request.parameter = IndexParameter::Reci;
    assert_eq!(client.visualization(&request).await.unwrap(), None);
}

#[tokio::test]
async fn test_visualization_error_member() {
    let client = serve(Router::new().route(
        "/api/forecast/visualization",
        post(|| async { Json(json!({"error": "No imagery"})) }),
    ))
    .await;

    let result = client.visualization(&visualization_request()).await;

    assert!(matches!(result, Err(AppError::Domain(m)) if m == "No imagery"));
}

// ============================================================================
// Forecast jobs
// ============================================================================

#[tokio::test]
async fn test_rejected_run_keeps_status_and_body() {
    let client = serve(Router::new().route(
        "/api/forecast/run",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "Slow down") }),
    ))
    .await;
    let mut form = ForecastForm::starting(date("2024-06-30"));
    form.location = "North".into();
    let request = ForecastRunRequest::new(None, &form, point());

    let result = client.run_forecast(&request).await;

    assert!(matches!(
        result,
        Err(AppError::Http { status: 429, ref body }) if body == "Slow down"
    ));
}

#[tokio::test]
async fn test_plain_text_acknowledgement_is_accepted() {
    let client = serve(Router::new().route(
        "/api/forecast/run",
        post(|| async { "Forecast started" }),
    ))
    .await;
    let mut form = ForecastForm::starting(date("2024-06-30"));
    form.location = "North".into();

    let result = client
        .run_forecast(&ForecastRunRequest::new(Some(3), &form, point()))
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_status_outcomes() {
    let client = serve(Router::new().route(
        "/api/forecast/status",
        get(|| async { Json(json!({"running": false, "message": "Failed: no imagery"})) }),
    ))
    .await;

    let status = client.forecast_status().await.unwrap();

    assert_eq!(status.outcome(), StatusOutcome::Failed("no imagery".into()));
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let client = ForecastApiClient::with_base_url("http://127.0.0.1:9").unwrap();

    let result = client.forecast_status().await;

    assert!(matches!(result, Err(AppError::Transport(_))));
}

// ============================================================================
// Session
// ============================================================================

fn session_backend() -> Router {
    Router::new()
        .route(
            "/api/auth/login",
            post(|Json(form): Json<Value>| async move {
                if form["password"] != "secret" {
                    return (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response();
                }
                (
                    [(header::SET_COOKIE, "session=abc123; Path=/; HttpOnly")],
                    Json(json!({"id": 7, "email": form["email"], "fullName": "Ada Farmer"})),
                )
                    .into_response()
            }),
        )
        .route(
            "/api/telegram/settings",
            get(|headers: HeaderMap| async move {
                let authed = headers
                    .get(header::COOKIE)
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|c| c.contains("session=abc123"));
                if authed {
                    Json(json!({"enabled": true, "chatId": "12345"})).into_response()
                } else {
                    StatusCode::UNAUTHORIZED.into_response()
                }
            }),
        )
}

#[tokio::test]
async fn test_session_cookie_is_sent_after_login() {
    let client = serve(session_backend()).await;

    let before = client.telegram_settings().await.unwrap_err();
    assert_eq!(before.user_message(), "Not authenticated. Please log in first.");

    let user = client
        .login(&LoginForm {
            email: "ada@example.com".into(),
            password: "secret".into(),
        })
        .await
        .unwrap();
    assert_eq!(user.id, 7);

    // Clones share the cookie store
    let settings = client.clone().telegram_settings().await.unwrap();
    assert!(settings.enabled);
    assert_eq!(settings.chat_id.as_deref(), Some("12345"));
}

#[tokio::test]
async fn test_bad_credentials_are_unauthorized() {
    let client = serve(session_backend()).await;

    let result = client
        .login(&LoginForm {
            email: "ada@example.com".into(),
            password: "wrong".into(),
        })
        .await;

    assert!(matches!(result, Err(AppError::Http { status: 401, .. })));
}
