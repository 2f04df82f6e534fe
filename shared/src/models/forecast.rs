//! Forecast form state and the payloads exchanged with the forecast backend

use chrono::{Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::geometry::Geometry;
use crate::models::yield_record::{IndexParameter, YieldRecord};
use crate::types::DateRange;

/// Dashboard form fields for a forecast run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastForm {
    /// Zone name
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub parameter: IndexParameter,
}

impl Default for ForecastForm {
    fn default() -> Self {
        Self::starting(Utc::now().date_naive())
    }
}

impl ForecastForm {
    /// Empty zone name, window from one year before `today` through `today`, NDVI
    pub fn starting(today: NaiveDate) -> Self {
        let year_ago = today
            .checked_sub_months(Months::new(12))
            .unwrap_or(today);
        Self {
            location: String::new(),
            start_date: year_ago,
            end_date: today,
            parameter: IndexParameter::Ndvi,
        }
    }

    /// Form contents when a history record is selected for editing
    pub fn from_record(record: &YieldRecord, today: NaiveDate) -> Self {
        let fallback = record.date.unwrap_or(today);
        Self {
            location: record.location.clone(),
            start_date: record.start_date.unwrap_or(fallback),
            end_date: record.end_date.unwrap_or(fallback),
            parameter: record.parameter_or_default(),
        }
    }

    /// Imagery window covered by the form
    pub fn window(&self) -> DateRange {
        DateRange {
            start: self.start_date,
            end: self.end_date,
        }
    }

    /// Apply a partial edit. Returns true when the imagery window or index changed.
    pub fn apply(&mut self, patch: ForecastFormPatch) -> bool {
        let mut imagery_changed = false;
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(start) = patch.start_date {
            imagery_changed |= start != self.start_date;
            self.start_date = start;
        }
        if let Some(end) = patch.end_date {
            imagery_changed |= end != self.end_date;
            self.end_date = end;
        }
        if let Some(parameter) = patch.parameter {
            imagery_changed |= parameter != self.parameter;
            self.parameter = parameter;
        }
        imagery_changed
    }
}

/// Partial form edit coming from the view
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastFormPatch {
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub parameter: Option<IndexParameter>,
}

/// Body of `POST /api/forecast/check-availability`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    pub geometry: Geometry,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Body of `POST /api/forecast/visualization`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizationRequest {
    pub geometry: Geometry,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub parameter: IndexParameter,
}

/// Response of `POST /api/forecast/visualization`
#[derive(Debug, Clone, Deserialize)]
pub struct VisualizationResponse {
    #[serde(default)]
    pub tile_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /api/forecast/run`.
///
/// `id` present means the backend updates that record in place.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastRunRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub location: String,
    pub geometry: Geometry,
    /// Run date; always the end of the window
    pub date: NaiveDate,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub parameter: IndexParameter,
}

impl ForecastRunRequest {
    pub fn new(id: Option<i64>, form: &ForecastForm, geometry: Geometry) -> Self {
        Self {
            id,
            location: form.location.trim().to_string(),
            geometry,
            date: form.end_date,
            start_date: form.start_date,
            end_date: form.end_date,
            parameter: form.parameter.clone(),
        }
    }
}

/// Response of `GET /api/forecast/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastStatus {
    pub running: bool,
    pub message: String,
}

/// How a status message relates to the job that was started
#[derive(Debug, Clone, PartialEq)]
pub enum StatusOutcome {
    /// Queued or still running
    Pending,
    /// Finished (possibly from the backend's result cache)
    Completed,
    /// Finished with the reason the backend gave
    Failed(String),
    /// Nothing running and no result reported
    Idle,
}

impl ForecastStatus {
    pub fn outcome(&self) -> StatusOutcome {
        let message = self.message.trim();
        let lower = message.to_ascii_lowercase();
        if lower.starts_with("completed") {
            StatusOutcome::Completed
        } else if lower.starts_with("failed") {
            let reason = message
                .split_once(':')
                .map(|(_, r)| r.trim())
                .filter(|r| !r.is_empty())
                .unwrap_or("Forecast failed");
            StatusOutcome::Failed(reason.to_string())
        } else if !self.running && lower == "idle" {
            StatusOutcome::Idle
        } else {
            StatusOutcome::Pending
        }
    }
}
