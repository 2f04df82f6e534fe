//! Scripted backend and geocoder shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use shared::{
    AvailabilityRequest, DataAvailability, ForecastRunRequest, ForecastStatus, LatLng,
    VisualizationRequest, YieldRecord,
};
use tokio::sync::mpsc::UnboundedReceiver;
use yf_dashboard::external::{ForecastBackend, GeocodeHit, Geocoder};
use yf_dashboard::services::{ControllerSettings, DashboardController, PollEvent, PollSettings};
use yf_dashboard::{AppError, AppResult};

/// Failure a scripted call answers with
#[derive(Debug, Clone)]
pub enum Failure {
    Domain(String),
    Http(u16),
    Transport,
    Parse,
}

impl Failure {
    fn to_error(&self) -> AppError {
        match self {
            Failure::Domain(m) => AppError::Domain(m.clone()),
            Failure::Http(status) => AppError::Http {
                status: *status,
                body: String::new(),
            },
            Failure::Transport => AppError::Transport("connection refused".into()),
            Failure::Parse => AppError::Parse("expected value at line 1".into()),
        }
    }
}

#[derive(Default)]
pub struct MockBackend {
    pub calls: Mutex<Vec<String>>,
    pub records: Mutex<Vec<YieldRecord>>,
    pub list_failure: Mutex<Option<Failure>>,
    pub availability: Mutex<Option<DataAvailability>>,
    pub availability_failure: Mutex<Option<Failure>>,
    /// How long an availability check takes to answer
    pub availability_delay: Mutex<Option<Duration>>,
    pub tile_url: Mutex<Option<String>>,
    pub run_failure: Mutex<Option<Failure>>,
    pub delete_failure: Mutex<Option<Failure>>,
    pub statuses: Mutex<VecDeque<ForecastStatus>>,
    pub last_run: Mutex<Option<ForecastRunRequest>>,
}

impl MockBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, name: &str) -> bool {
        self.calls().iter().any(|c| c == name)
    }

    pub fn script_statuses(&self, statuses: &[(bool, &str)]) {
        let mut queue = self.statuses.lock().unwrap();
        queue.clear();
        for (running, message) in statuses {
            queue.push_back(ForecastStatus {
                running: *running,
                message: message.to_string(),
            });
        }
    }

    fn record(&self, name: &str) {
        self.calls.lock().unwrap().push(name.to_string());
    }

    fn scripted(&self, slot: &Mutex<Option<Failure>>) -> AppResult<()> {
        match slot.lock().unwrap().as_ref() {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ForecastBackend for MockBackend {
    async fn list_yields(&self) -> AppResult<Vec<YieldRecord>> {
        self.record("list_yields");
        self.scripted(&self.list_failure)?;
        Ok(self.records.lock().unwrap().clone())
    }

    async fn delete_yield(&self, id: i64) -> AppResult<()> {
        self.record("delete_yield");
        self.scripted(&self.delete_failure)?;
        self.records.lock().unwrap().retain(|r| r.id != id);
        Ok(())
    }

    async fn check_availability(&self, _request: &AvailabilityRequest) -> AppResult<DataAvailability> {
        self.record("check_availability");
        let delay = *self.availability_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.scripted(&self.availability_failure)?;
        Ok(self
            .availability
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(DataAvailability {
                total_images: 0,
                available_dates: Vec::new(),
                date_range: None,
            }))
    }

    async fn visualization(&self, _request: &VisualizationRequest) -> AppResult<Option<String>> {
        self.record("visualization");
        Ok(self.tile_url.lock().unwrap().clone())
    }

    async fn run_forecast(&self, request: &ForecastRunRequest) -> AppResult<()> {
        self.record("run_forecast");
        self.scripted(&self.run_failure)?;
        *self.last_run.lock().unwrap() = Some(request.clone());
        Ok(())
    }

    async fn forecast_status(&self) -> AppResult<ForecastStatus> {
        self.record("forecast_status");
        let mut queue = self.statuses.lock().unwrap();
        // The last scripted status repeats
        let status = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        Ok(status.unwrap_or(ForecastStatus {
            running: true,
            message: "Processing".into(),
        }))
    }
}

#[derive(Default)]
pub struct MockGeocoder {
    pub hit: Mutex<Option<GeocodeHit>>,
    pub fail: Mutex<bool>,
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn search(&self, _query: &str) -> AppResult<Option<GeocodeHit>> {
        if *self.fail.lock().unwrap() {
            return Err(AppError::Transport("dns".into()));
        }
        Ok(self.hit.lock().unwrap().clone())
    }
}

pub fn settings() -> ControllerSettings {
    ControllerSettings {
        poll: PollSettings {
            interval: Duration::from_secs(5),
            max_attempts: 3,
        },
        ..ControllerSettings::default()
    }
}

pub fn controller(
    backend: &Arc<MockBackend>,
) -> (DashboardController, UnboundedReceiver<PollEvent>) {
    controller_with_geocoder(backend, Arc::new(MockGeocoder::default()))
}

pub fn controller_with_geocoder(
    backend: &Arc<MockBackend>,
    geocoder: Arc<MockGeocoder>,
) -> (DashboardController, UnboundedReceiver<PollEvent>) {
    DashboardController::new(backend.clone(), geocoder, settings())
}

pub fn record(json: serde_json::Value) -> YieldRecord {
    serde_json::from_value(json).unwrap()
}

pub fn hit(lat: f64, lng: f64, name: &str) -> GeocodeHit {
    GeocodeHit {
        position: LatLng::new(lat, lng),
        display_name: name.to_string(),
    }
}
