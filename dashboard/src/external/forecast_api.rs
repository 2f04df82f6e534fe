//! Forecast backend client
//!
//! Talks to the YieldForecast REST API: yield records, availability checks,
//! visualization tiles, forecast jobs, Telegram settings and the login session.
//! The session cookie set by `/api/auth/login` is kept in the client's cookie
//! store and sent on every later request.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shared::{
    AvailabilityRequest, DataAvailability, EnableTelegramRequest, ForecastRunRequest,
    ForecastStatus, LoginForm, TelegramResponse, TelegramSettings, UserProfile,
    VisualizationRequest, VisualizationResponse, YieldRecord,
};

use crate::config::ApiConfig;
use crate::error::{AppError, AppResult};

/// Message of a `GET /api/yields` body that is valid JSON but not a list
pub const INVALID_FORMAT_MESSAGE: &str = "Received invalid data format from server";

/// Operations the dashboard needs from the forecast backend
#[async_trait]
pub trait ForecastBackend: Send + Sync {
    /// `GET /api/yields`. A non-array body is [`AppError::Domain`].
    async fn list_yields(&self) -> AppResult<Vec<YieldRecord>>;

    /// `DELETE /api/yields/{id}`
    async fn delete_yield(&self, id: i64) -> AppResult<()>;

    /// `POST /api/forecast/check-availability`. A body with `error` is [`AppError::Domain`].
    async fn check_availability(&self, request: &AvailabilityRequest)
        -> AppResult<DataAvailability>;

    /// `POST /api/forecast/visualization`; `None` when no tile URL came back
    async fn visualization(&self, request: &VisualizationRequest) -> AppResult<Option<String>>;

    /// `POST /api/forecast/run`
    async fn run_forecast(&self, request: &ForecastRunRequest) -> AppResult<()>;

    /// `GET /api/forecast/status`
    async fn forecast_status(&self) -> AppResult<ForecastStatus>;
}

/// Forecast backend API client
#[derive(Clone)]
pub struct ForecastApiClient {
    client: Client,
    base_url: String,
}

impl ForecastApiClient {
    /// Create a new client from configuration
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a new client with custom base URL (for testing)
    pub fn with_base_url(base_url: impl Into<String>) -> AppResult<Self> {
        let config = ApiConfig {
            base_url: base_url.into(),
            ..ApiConfig::default()
        };
        Self::new(&config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request, mapping transport failures and non-success statuses
    async fn send(&self, request: RequestBuilder) -> AppResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Forecast API error: {} - {}", status, preview(&body));
            return Err(AppError::Http { status, body });
        }

        Ok(response)
    }

    /// Read the body as JSON; a body that is not JSON is a parse error
    async fn read_json<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        let text = response
            .text()
            .await
            .map_err(|e| AppError::Transport(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::debug!("Unparsable response body: {}", preview(&text));
            AppError::Parse(e.to_string())
        })
    }

    // ------------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------------

    /// Log in; the session cookie is retained for subsequent calls
    pub async fn login(&self, form: &LoginForm) -> AppResult<UserProfile> {
        let response = self
            .send(self.client.post(self.url("/api/auth/login")).json(form))
            .await?;
        Self::read_json(response).await
    }

    pub async fn logout(&self) -> AppResult<()> {
        self.send(self.client.post(self.url("/api/auth/logout")))
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Telegram
    // ------------------------------------------------------------------------

    pub async fn telegram_settings(&self) -> AppResult<TelegramSettings> {
        let response = self
            .send(self.client.get(self.url("/api/telegram/settings")))
            .await?;
        Self::read_json(response).await
    }

    pub async fn enable_telegram(&self, chat_id: &str) -> AppResult<TelegramResponse> {
        let body = EnableTelegramRequest {
            chat_id: chat_id.trim().to_string(),
        };
        let response = self
            .send(self.client.post(self.url("/api/telegram/enable")).json(&body))
            .await?;
        Self::read_json(response).await
    }

    pub async fn disable_telegram(&self) -> AppResult<TelegramResponse> {
        let response = self
            .send(self.client.post(self.url("/api/telegram/disable")))
            .await?;
        Self::read_json(response).await
    }

    pub async fn test_telegram(&self) -> AppResult<TelegramResponse> {
        let response = self
            .send(self.client.get(self.url("/api/telegram/test")))
            .await?;
        Self::read_json(response).await
    }
}

#[async_trait]
impl ForecastBackend for ForecastApiClient {
    async fn list_yields(&self) -> AppResult<Vec<YieldRecord>> {
        let response = self.send(self.client.get(self.url("/api/yields"))).await?;
        let body: Value = Self::read_json(response).await?;
        parse_yield_list(body)
    }

    async fn delete_yield(&self, id: i64) -> AppResult<()> {
        self.send(self.client.delete(self.url(&format!("/api/yields/{}", id))))
            .await?;
        tracing::info!("Deleted yield record {}", id);
        Ok(())
    }

    async fn check_availability(
        &self,
        request: &AvailabilityRequest,
    ) -> AppResult<DataAvailability> {
        let response = self
            .send(
                self.client
                    .post(self.url("/api/forecast/check-availability"))
                    .json(request),
            )
            .await?;
        let body: Value = Self::read_json(response).await?;
        parse_availability(body)
    }

    async fn visualization(&self, request: &VisualizationRequest) -> AppResult<Option<String>> {
        let response = self
            .send(
                self.client
                    .post(self.url("/api/forecast/visualization"))
                    .json(request),
            )
            .await?;
        let body: VisualizationResponse = Self::read_json(response).await?;
        if let Some(error) = body.error {
            return Err(AppError::Domain(error));
        }
        Ok(body.tile_url.filter(|url| !url.is_empty()))
    }

    async fn run_forecast(&self, request: &ForecastRunRequest) -> AppResult<()> {
        // The body is a plain-text acknowledgement
        self.send(self.client.post(self.url("/api/forecast/run")).json(request))
            .await?;
        tracing::info!(
            "Forecast accepted for '{}' ({})",
            request.location,
            request.parameter
        );
        Ok(())
    }

    async fn forecast_status(&self) -> AppResult<ForecastStatus> {
        let response = self
            .send(self.client.get(self.url("/api/forecast/status")))
            .await?;
        Self::read_json(response).await
    }
}

/// Decode a yield list, skipping entries that are not records
pub fn parse_yield_list(body: Value) -> AppResult<Vec<YieldRecord>> {
    let Value::Array(items) = body else {
        return Err(AppError::Domain(INVALID_FORMAT_MESSAGE.to_string()));
    };
    let records = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<YieldRecord>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping malformed yield record: {}", e);
                None
            }
        })
        .collect();
    Ok(records)
}

/// Decode an availability body; an `error` member is a domain failure
pub fn parse_availability(body: Value) -> AppResult<DataAvailability> {
    if let Some(error) = body.get("error") {
        let message = match error {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(AppError::Domain(message));
    }
    serde_json::from_value(body).map_err(|e| AppError::Parse(e.to_string()))
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_yield_list_non_array_is_domain_error() {
        let result = parse_yield_list(json!({"error": "Unauthorized"}));
        assert!(matches!(result, Err(AppError::Domain(m)) if m == INVALID_FORMAT_MESSAGE));
    }

    #[test]
    fn test_yield_list_skips_malformed_entries() {
        let records = parse_yield_list(json!([
            {"id": 1, "location": "A"},
            {"location": "missing id"},
            {"id": 2, "location": "B"}
        ]))
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].id, 2);
    }

    #[test]
    fn test_availability_error_member() {
        let result = parse_availability(json!({"error": "No geometry provided"}));
        assert!(matches!(result, Err(AppError::Domain(m)) if m == "No geometry provided"));
    }

    #[test]
    fn test_availability_snapshot() {
        let availability = parse_availability(json!({
            "totalImages": 3,
            "availableDates": [{"date": "2024-05-01", "cloudCoverage": 4.2, "quality": "good"}]
        }))
        .unwrap();
        assert_eq!(availability.total_images, 3);
    }

    #[test]
    fn test_availability_wrong_shape_is_parse_error() {
        let result = parse_availability(json!({"totalImages": "many"}));
        assert!(matches!(result, Err(AppError::Parse(_))));
    }

    #[test]
    fn test_base_url_trailing_slash() {
        let client = ForecastApiClient::with_base_url("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.url("/api/yields"), "http://localhost:8080/api/yields");
    }
}
