//! Forecast lifecycle controller
//!
//! [`DashboardController`] is the single owned store behind the dashboard. It
//! holds the form, the current zone geometry, the record list, tile layers, the
//! map scene and the notification log, and every change goes through one of
//! its named operations. Backend failures are turned into a status message and
//! a notification inside the operation; they never escape it.
//!
//! Operations never await the network. One that needs the backend returns a
//! [`Pending`] list; its replies come back through
//! [`DashboardController::apply_reply`]. Replies for a zone or date window that
//! has since changed are dropped.
//!
//! ```text
//! Idle -> (zone drawn/edited) -> GeometryReady
//! GeometryReady -> CheckingAvailability -> GeometryReady
//! GeometryReady -> Forecasting -> Idle (completed) | GeometryReady (failed)
//! Any -> (zone deleted) -> Idle
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use shared::{
    validate_date_range, validate_opacity, validate_zone_name, AvailabilityRequest,
    DataAvailability, ForecastForm, ForecastFormPatch, ForecastRunRequest, Geometry,
    IndexParameter, LatLng, NewNotification, NotificationCategory, NotificationLog,
    TileLayers, VisualizationRequest, YieldRecord,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::external::{ForecastBackend, GeocodeHit, Geocoder};
use crate::map::{MapAdapter, MapScene, NativeShape, ShapeMutation, TileOverlayManager};
use crate::services::pending::{BackendCall, BackendReply, Pending, Reply, Request};
use crate::services::poller::{spawn_status_poller, PollEvent, PollOutcome, PollSettings};

/// Status shown when polling gives up before the job reports completion
pub const TIMEOUT_MESSAGE: &str =
    "Forecast is still processing. Results will appear after refreshing.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// No zone
    Idle,
    /// A zone is drawn or selected
    GeometryReady,
    CheckingAvailability,
    Forecasting,
}

/// Controller tuning taken from configuration
#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub poll: PollSettings,
    pub default_parameter: IndexParameter,
    pub map_center: LatLng,
    pub map_zoom: u8,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ControllerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll: PollSettings {
                interval: config.forecast.poll_interval(),
                max_attempts: config.forecast.max_poll_attempts,
            },
            default_parameter: config.forecast.default_parameter(),
            map_center: config.map.center(),
            map_zoom: config.map.zoom,
        }
    }
}

/// Everything the browser view needs to draw the dashboard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub phase: LifecyclePhase,
    pub form: ForecastForm,
    pub geometry: Option<Geometry>,
    pub selected_geometry: Option<Geometry>,
    pub selected_record_id: Option<i64>,
    pub drawn_shape: Option<NativeShape>,
    pub availability: Option<DataAvailability>,
    pub availability_error: Option<String>,
    /// The availability panel offers a retry
    pub can_retry_availability: bool,
    pub records: Vec<YieldRecord>,
    pub status_message: String,
    pub layers: TileLayers,
    pub map: MapScene,
    pub is_polling: bool,
    pub unread_notifications: usize,
}

/// Context of the run currently being polled
#[derive(Debug, Clone)]
struct ActiveRun {
    location: String,
}

pub struct DashboardController {
    backend: Arc<dyn ForecastBackend>,
    geocoder: Arc<dyn Geocoder>,
    settings: ControllerSettings,

    phase: LifecyclePhase,
    form: ForecastForm,
    geometry: Option<Geometry>,
    selected_geometry: Option<Geometry>,
    selected_record_id: Option<i64>,
    availability: Option<DataAvailability>,
    availability_error: Option<String>,
    records: Vec<YieldRecord>,
    status_message: String,
    layers: TileLayers,
    notifications: NotificationLog,

    adapter: MapAdapter,
    scene: MapScene,
    tiles: TileOverlayManager,

    /// Bumped whenever the zone or its date window changes
    zone_revision: u64,
    /// A run request is on its way to the backend
    launching: bool,
    generation: u64,
    poller: Option<JoinHandle<()>>,
    poll_events: UnboundedSender<PollEvent>,
    active_run: Option<ActiveRun>,
}

impl DashboardController {
    /// Create the controller and the receiving end of its poll event channel.
    ///
    /// The receiver must be pumped into [`DashboardController::apply_poll_event`].
    pub fn new(
        backend: Arc<dyn ForecastBackend>,
        geocoder: Arc<dyn Geocoder>,
        settings: ControllerSettings,
    ) -> (Self, UnboundedReceiver<PollEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scene = MapScene::new(settings.map_center, settings.map_zoom);
        let controller = Self {
            backend,
            geocoder,
            form: fresh_form(&settings),
            settings,
            phase: LifecyclePhase::Idle,
            geometry: None,
            selected_geometry: None,
            selected_record_id: None,
            availability: None,
            availability_error: None,
            records: Vec::new(),
            status_message: String::new(),
            layers: TileLayers::default(),
            notifications: NotificationLog::new(),
            adapter: MapAdapter::new(),
            scene,
            tiles: TileOverlayManager::new(),
            zone_revision: 0,
            launching: false,
            generation: 0,
            poller: None,
            poll_events: tx,
            active_run: None,
        };
        (controller, rx)
    }

    /// Greet the user and load the record list
    pub fn start(&mut self) -> Pending {
        self.notify(NewNotification::info(
            NotificationCategory::System,
            "Welcome to YieldForecast",
            "Draw a zone on the map to start forecasting crop yields.",
        ));
        self.refresh_records()
    }

    fn call(&self, request: Request) -> Pending {
        Pending::one(BackendCall {
            request,
            zone: self.zone_revision,
            backend: Arc::clone(&self.backend),
            geocoder: Arc::clone(&self.geocoder),
        })
    }

    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> DashboardSnapshot {
        DashboardSnapshot {
            phase: self.phase,
            form: self.form.clone(),
            geometry: self.geometry.clone(),
            selected_geometry: self.selected_geometry.clone(),
            selected_record_id: self.selected_record_id,
            drawn_shape: self.adapter.drawn_shape().cloned(),
            availability: self.availability.clone(),
            availability_error: self.availability_error.clone(),
            can_retry_availability: self.availability_error.is_some(),
            records: self.records.clone(),
            status_message: self.status_message.clone(),
            layers: self.layers.clone(),
            map: self.scene.clone(),
            is_polling: self.is_polling(),
            unread_notifications: self
                .notifications
                .visible(shared::NotificationFilter::All)
                .len(),
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.phase
    }

    pub fn form(&self) -> &ForecastForm {
        &self.form
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }

    pub fn selected_geometry(&self) -> Option<&Geometry> {
        self.selected_geometry.as_ref()
    }

    pub fn selected_record_id(&self) -> Option<i64> {
        self.selected_record_id
    }

    pub fn availability(&self) -> Option<&DataAvailability> {
        self.availability.as_ref()
    }

    pub fn availability_error(&self) -> Option<&str> {
        self.availability_error.as_deref()
    }

    pub fn records(&self) -> &[YieldRecord] {
        &self.records
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn layers(&self) -> &TileLayers {
        &self.layers
    }

    pub fn scene(&self) -> &MapScene {
        &self.scene
    }

    pub fn tiles(&self) -> &TileOverlayManager {
        &self.tiles
    }

    pub fn notifications(&self) -> &NotificationLog {
        &self.notifications
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// A run request has been sent and not yet answered
    pub fn is_launching(&self) -> bool {
        self.launching
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|h| !h.is_finished())
    }

    // ------------------------------------------------------------------------
    // Notifications
    // ------------------------------------------------------------------------

    pub fn dismiss_notification(&mut self, id: Uuid) -> AppResult<()> {
        if self.notifications.dismiss(id) {
            Ok(())
        } else {
            Err(AppError::NotFound("Notification".to_string()))
        }
    }

    pub fn clear_notifications(&mut self) {
        self.notifications.clear_all();
    }

    fn notify(&mut self, notification: NewNotification) {
        tracing::debug!("Notification: {} - {}", notification.title, notification.message);
        self.notifications.push(notification);
    }

    // ------------------------------------------------------------------------
    // Backend replies
    // ------------------------------------------------------------------------

    /// Apply the answer to a call an earlier operation returned
    pub fn apply_reply(&mut self, reply: BackendReply) -> Pending {
        let current = reply.zone == self.zone_revision;
        match reply.reply {
            Reply::Yields(result) => {
                self.finish_refresh(result);
                Pending::none()
            }
            Reply::Deleted(id, result) => self.finish_delete(id, result),
            Reply::Availability(result) => {
                self.finish_availability_check(result, current);
                Pending::none()
            }
            Reply::Visualization(parameter, result) => {
                if current {
                    self.finish_visualization(parameter, result);
                } else {
                    tracing::debug!("Dropping {} tiles of a previous zone", parameter);
                }
                Pending::none()
            }
            Reply::ForecastStarted(request, result) => {
                self.finish_forecast_start(request, result);
                Pending::none()
            }
            Reply::Geocoded(query, result) => {
                self.finish_search(&query, result);
                Pending::none()
            }
        }
    }

    // ------------------------------------------------------------------------
    // Map drawing events
    // ------------------------------------------------------------------------

    /// A shape was drawn with the drawing tools
    pub fn shape_created(&mut self, shape: NativeShape) -> Pending {
        match self.adapter.shape_created(shape) {
            Ok(geometry) => self.zone_drawn(geometry),
            Err(e) => self.reject_shape(e),
        }
    }

    /// The drawn shape was replaced by the edit toolbar
    pub fn shape_edited(&mut self, shape: NativeShape) -> Pending {
        match self.adapter.shape_edited(shape) {
            Ok(geometry) => self.zone_edited(geometry),
            Err(e) => self.reject_shape(e),
        }
    }

    /// One vertex/bounds/center/radius event while editing
    pub fn shape_mutated(&mut self, mutation: ShapeMutation) -> Pending {
        match self.adapter.shape_mutated(&mutation) {
            Some(Ok(geometry)) => self.zone_edited(geometry),
            Some(Err(e)) => self.reject_shape(e),
            None => Pending::none(),
        }
    }

    pub fn shape_deleted(&mut self) {
        self.adapter.shape_deleted();
        self.zone_deleted();
    }

    fn reject_shape(&mut self, error: shared::GeometryError) -> Pending {
        tracing::warn!("Rejected drawn shape: {}", error);
        self.status_message = format!("Invalid zone: {}", error);
        self.notify(NewNotification::warning(
            NotificationCategory::System,
            "Invalid Zone",
            error.to_string(),
        ));
        Pending::none()
    }

    // ------------------------------------------------------------------------
    // Zone lifecycle
    // ------------------------------------------------------------------------

    pub fn zone_drawn(&mut self, geometry: Geometry) -> Pending {
        tracing::info!("Zone drawn ({})", geometry.kind());
        self.replace_geometry(Some(geometry));
        self.status_message = "Zone drawn! You can now run a forecast. Optionally check satellite data availability first.".to_string();
        self.notify(NewNotification::success(
            NotificationCategory::Activity,
            "Zone Created",
            "New zone drawn on map. Ready to run forecast.",
        ));
        self.refresh_visualization()
    }

    pub fn zone_edited(&mut self, geometry: Geometry) -> Pending {
        tracing::info!("Zone edited ({})", geometry.kind());
        self.replace_geometry(Some(geometry));
        self.status_message = "Zone updated. You can run a forecast with the new area.".to_string();
        self.notify(NewNotification::info(
            NotificationCategory::Activity,
            "Zone Updated",
            "Zone boundaries have been modified.",
        ));
        self.refresh_visualization()
    }

    pub fn zone_deleted(&mut self) {
        tracing::info!("Zone deleted");
        self.replace_geometry(None);
        self.selected_geometry = None;
        self.adapter.show_geometry(&mut self.scene, None);
        if self.selected_record_id.is_some() {
            self.cancel_edit();
        }
        self.status_message = "Zone deleted.".to_string();
        self.notify(NewNotification::info(
            NotificationCategory::Activity,
            "Zone Deleted",
            "Zone removed from map.",
        ));
    }

    /// Swap the current geometry; availability and tile URLs belong to the old one
    fn replace_geometry(&mut self, geometry: Option<Geometry>) {
        self.geometry = geometry;
        self.zone_revision += 1;
        self.availability = None;
        self.availability_error = None;
        self.layers.invalidate();
        self.sync_tiles();
        self.settle_phase();
    }

    fn settle_phase(&mut self) {
        if self.phase == LifecyclePhase::Forecasting {
            return;
        }
        self.phase = if self.geometry.is_some() {
            LifecyclePhase::GeometryReady
        } else {
            LifecyclePhase::Idle
        };
    }

    // ------------------------------------------------------------------------
    // Availability
    // ------------------------------------------------------------------------

    /// Check satellite imagery for the current zone; also serves as retry.
    ///
    /// Does nothing while a check is already outstanding.
    pub fn check_availability(&mut self) -> Pending {
        let Some(geometry) = self.geometry.clone() else {
            self.availability = None;
            self.availability_error = None;
            return Pending::none();
        };
        if self.phase == LifecyclePhase::CheckingAvailability {
            tracing::debug!("Availability check already outstanding");
            return Pending::none();
        }

        if self.phase != LifecyclePhase::Forecasting {
            self.phase = LifecyclePhase::CheckingAvailability;
        }
        self.availability_error = None;
        self.status_message = "Checking satellite data availability...".to_string();

        self.call(Request::Availability(AvailabilityRequest {
            geometry,
            start_date: self.form.start_date,
            end_date: self.form.end_date,
        }))
    }

    fn finish_availability_check(&mut self, result: AppResult<DataAvailability>, current: bool) {
        if self.phase == LifecyclePhase::CheckingAvailability {
            self.settle_phase();
        }
        if !current {
            tracing::debug!("Dropping availability of a previous zone");
            return;
        }

        match result {
            Ok(availability) => {
                let count = availability.total_images;
                tracing::info!("Availability: {} images", count);
                self.availability = Some(availability);
                self.status_message = format!("Found {} satellite images for this area.", count);
                self.notify(NewNotification::success(
                    NotificationCategory::Activity,
                    "Satellite Data Available",
                    format!(
                        "Found {} images for the selected area and date range.",
                        count
                    ),
                ));
            }
            Err(e) => {
                self.availability = None;
                let (detail, title, message) = match &e {
                    AppError::Domain(reason) => (
                        reason.clone(),
                        "Availability Check Failed",
                        reason.clone(),
                    ),
                    AppError::Http { status, body } => (
                        format!("Failed to check availability: {} {}", status, body.trim()),
                        "Availability Check Failed",
                        format!("Server error: {}", status),
                    ),
                    AppError::Transport(reason) => (
                        format!("Error checking availability: {}", reason),
                        "Connection Error",
                        "Failed to check satellite data availability.".to_string(),
                    ),
                    other => (
                        other.user_message(),
                        "Availability Check Failed",
                        other.user_message(),
                    ),
                };
                tracing::warn!("Availability check failed: {}", e);
                self.status_message = format!("Availability check failed: {}", detail);
                self.availability_error = Some(detail);
                self.notify(NewNotification::error(
                    NotificationCategory::System,
                    title,
                    message,
                ));
            }
        }
    }

    // ------------------------------------------------------------------------
    // Forecast runs
    // ------------------------------------------------------------------------

    /// Start a forecast for the current zone.
    ///
    /// Input problems are returned as [`AppError::Validation`] before any
    /// backend call. Backend failures are reported through the status message.
    /// A run already being polled keeps its poller until the backend accepts
    /// the new one.
    pub fn run_forecast(&mut self) -> AppResult<Pending> {
        if let Err(message) = validate_zone_name(&self.form.location) {
            self.status_message = message.to_string();
            self.notify(NewNotification::warning(
                NotificationCategory::System,
                "Missing Zone Name",
                "Please enter a name for the zone.",
            ));
            return Err(AppError::validation("location", message));
        }
        let Some(geometry) = self.geometry.clone() else {
            let message = "Please draw a zone on the map first.";
            self.status_message = message.to_string();
            self.notify(NewNotification::warning(
                NotificationCategory::System,
                "No Zone Selected",
                "Please draw a zone on the map before running forecast.",
            ));
            return Err(AppError::validation("geometry", message));
        };
        if let Err(message) = validate_date_range(&self.form.window()) {
            self.status_message = message.to_string();
            self.notify(NewNotification::warning(
                NotificationCategory::System,
                "Invalid Date Range",
                message,
            ));
            return Err(AppError::validation("startDate", message));
        }
        if self.launching {
            return Err(AppError::validation(
                "forecast",
                "A forecast is already being started.",
            ));
        }

        let request = ForecastRunRequest::new(self.selected_record_id, &self.form, geometry);
        self.launching = true;
        self.phase = LifecyclePhase::Forecasting;
        self.status_message = "Starting forecast process...".to_string();
        self.notify(NewNotification::info(
            NotificationCategory::Activity,
            "Forecast Started",
            format!(
                "Processing forecast for \"{}\". This may take a few minutes...",
                request.location
            ),
        ));

        Ok(self.call(Request::RunForecast(request)))
    }

    fn finish_forecast_start(&mut self, request: ForecastRunRequest, result: AppResult<()>) {
        self.launching = false;

        match result {
            Ok(()) => {
                self.stop_poller();
                self.generation += 1;
                self.phase = LifecyclePhase::Forecasting;
                self.status_message = if request.id.is_some() {
                    "Update started! Large areas may take several minutes to process..."
                } else {
                    "Forecast started! Large areas may take several minutes to process..."
                }
                .to_string();
                self.active_run = Some(ActiveRun {
                    location: request.location,
                });
                self.poller = Some(spawn_status_poller(
                    Arc::clone(&self.backend),
                    self.generation,
                    self.settings.poll,
                    self.poll_events.clone(),
                ));
                tracing::info!("Forecast run #{} accepted", self.generation);
            }
            Err(e) => {
                tracing::warn!("Forecast run rejected: {}", e);
                let (title, message) = match &e {
                    AppError::Transport(_) => {
                        self.status_message = "Error connecting to server.".to_string();
                        ("Connection Error", "Unable to connect to forecast service.".to_string())
                    }
                    AppError::Http { status, body } => {
                        let reason = body.trim();
                        self.status_message = if reason.is_empty() {
                            format!("Failed to start forecast: {}", status)
                        } else {
                            format!("Failed to start forecast: {} {}", status, reason)
                        };
                        ("Forecast Failed", format!("Failed to start forecast: {}", status))
                    }
                    other => {
                        self.status_message =
                            format!("Failed to start forecast: {}", other.user_message());
                        ("Forecast Failed", other.user_message())
                    }
                };
                self.notify(NewNotification::error(
                    NotificationCategory::System,
                    title,
                    message,
                ));
                if self.is_polling() {
                    // The earlier run is still going
                    self.phase = LifecyclePhase::Forecasting;
                } else {
                    self.phase = LifecyclePhase::GeometryReady;
                    self.settle_phase();
                }
            }
        }
    }

    /// Apply an event from the status poller; events of superseded runs are dropped
    pub fn apply_poll_event(&mut self, event: PollEvent) -> Pending {
        if event.generation != self.generation || self.phase != LifecyclePhase::Forecasting {
            tracing::debug!(
                "Ignoring poll event from run #{} (current #{})",
                event.generation,
                self.generation
            );
            return Pending::none();
        }

        if event.outcome.is_terminal() {
            self.poller = None;
        }
        let location = self
            .active_run
            .as_ref()
            .map(|r| r.location.clone())
            .unwrap_or_default();

        let pending = match event.outcome {
            PollOutcome::Progress(message) => {
                self.status_message = format!("Forecast in progress: {}", message);
                Pending::none()
            }
            PollOutcome::Completed => {
                self.active_run = None;
                self.phase = LifecyclePhase::Idle;
                self.selected_record_id = None;
                self.selected_geometry = None;
                self.adapter.show_geometry(&mut self.scene, None);
                self.status_message = "Forecast completed. Results updated.".to_string();
                self.notify(NewNotification::success(
                    NotificationCategory::Crop,
                    "Forecast Complete",
                    format!(
                        "Forecast for \"{}\" has been completed successfully.",
                        location
                    ),
                ));
                self.refresh_records()
            }
            PollOutcome::Failed(reason) => {
                self.active_run = None;
                self.phase = LifecyclePhase::GeometryReady;
                self.status_message = format!("Forecast failed: {}", reason);
                self.notify(NewNotification::error(
                    NotificationCategory::Crop,
                    "Forecast Failed",
                    format!("Forecast for \"{}\" failed: {}", location, reason),
                ));
                Pending::none()
            }
            PollOutcome::TimedOut => {
                self.active_run = None;
                self.phase = LifecyclePhase::GeometryReady;
                self.status_message = TIMEOUT_MESSAGE.to_string();
                self.notify(NewNotification::warning(
                    NotificationCategory::Crop,
                    "Forecast Still Processing",
                    TIMEOUT_MESSAGE,
                ));
                Pending::none()
            }
        };
        if self.phase == LifecyclePhase::GeometryReady && self.geometry.is_none() {
            self.phase = LifecyclePhase::Idle;
        }
        pending
    }

    fn stop_poller(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.abort();
            tracing::debug!("Aborted poller of run #{}", self.generation);
        }
    }

    /// Abort the poller and take every overlay off the map
    pub fn shutdown(&mut self) {
        self.stop_poller();
        self.generation += 1;
        self.active_run = None;
        self.launching = false;
        if self.phase == LifecyclePhase::Forecasting {
            self.phase = LifecyclePhase::GeometryReady;
            self.settle_phase();
        }
        self.tiles.detach(&mut self.scene);
        self.adapter.show_geometry(&mut self.scene, None);
        tracing::info!("Dashboard controller shut down");
    }

    // ------------------------------------------------------------------------
    // Records
    // ------------------------------------------------------------------------

    pub fn refresh_records(&mut self) -> Pending {
        self.call(Request::ListYields)
    }

    fn finish_refresh(&mut self, result: AppResult<Vec<YieldRecord>>) {
        match result {
            Ok(records) => {
                tracing::info!("Loaded {} yield records", records.len());
                let count = records.len();
                self.records = records;
                if count > 0 {
                    self.notify(NewNotification::success(
                        NotificationCategory::Activity,
                        "Data Loaded",
                        format!("Successfully loaded {} forecast records.", count),
                    ));
                }
            }
            Err(AppError::Domain(message)) => {
                tracing::warn!("Yield list rejected: {}", message);
                self.records.clear();
                self.status_message = format!("Error: {}", message);
                self.notify(NewNotification::error(
                    NotificationCategory::System,
                    "Data Error",
                    "Received invalid data format from server.",
                ));
            }
            Err(AppError::Parse(e)) => {
                tracing::warn!("Yield list unparsable: {}", e);
                self.status_message = "Error parsing data from server".to_string();
                self.notify(NewNotification::error(
                    NotificationCategory::System,
                    "Parse Error",
                    "Failed to parse data from server.",
                ));
            }
            Err(AppError::Http { status, .. }) => {
                self.status_message = format!("Error fetching data: {}", status);
                self.notify(NewNotification::error(
                    NotificationCategory::System,
                    "Fetch Error",
                    format!("Failed to fetch data: {}", status),
                ));
            }
            Err(AppError::Transport(reason)) => {
                tracing::error!("Failed to fetch yield records: {}", reason);
                self.status_message = format!("Network error fetching data: {}", reason);
                self.notify(NewNotification::error(
                    NotificationCategory::System,
                    "Network Error",
                    "Unable to connect to server.",
                ));
            }
            Err(e) => {
                tracing::error!("Failed to fetch yield records: {}", e);
                self.status_message = e.user_message();
                self.notify(NewNotification::error(
                    NotificationCategory::System,
                    "Fetch Error",
                    e.user_message(),
                ));
            }
        }
    }

    /// Re-hydrate the form and zone from a history record. Never fails.
    pub fn select_record(&mut self, record: YieldRecord) -> Pending {
        tracing::info!("Selected record {}", record.id);
        self.selected_record_id = Some(record.id);
        let mut form = ForecastForm::from_record(&record, Utc::now().date_naive());
        if record.parameter.is_none() {
            form.parameter = self.settings.default_parameter.clone();
        }
        self.form = form;

        let fallback = record.position().map(Geometry::point);
        let (geometry, point_only) = match record.geometry() {
            Some(Ok(geometry)) => (Some(geometry), false),
            Some(Err(e)) => {
                tracing::warn!("Record {} has malformed geometry: {}", record.id, e);
                (fallback, true)
            }
            None => (fallback, true),
        };

        let Some(geometry) = geometry else {
            self.status_message = format!("Editing record \"{}\".", record.location);
            return Pending::none();
        };

        self.adapter.show_geometry(&mut self.scene, Some(&geometry));
        self.selected_geometry = Some(geometry.clone());
        self.replace_geometry(Some(geometry));
        if point_only {
            self.status_message = format!("Editing record \"{}\" (Point only).", record.location);
        } else {
            self.status_message = format!("Editing record \"{}\".", record.location);
            self.notify(NewNotification::info(
                NotificationCategory::Activity,
                "Record Selected",
                format!("Editing \"{}\".", record.location),
            ));
        }
        self.refresh_visualization()
    }

    pub fn select_record_by_id(&mut self, id: i64) -> AppResult<Pending> {
        let record = self
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Record {}", id)))?;
        Ok(self.select_record(record))
    }

    /// Leave edit mode: fresh form, no selection, no zone
    pub fn cancel_edit(&mut self) {
        self.selected_record_id = None;
        self.form = fresh_form(&self.settings);
        self.selected_geometry = None;
        self.adapter.show_geometry(&mut self.scene, None);
        self.adapter.shape_deleted();
        self.replace_geometry(None);
        self.status_message.clear();
    }

    /// Delete a record. Without confirmation nothing is sent and `None` is returned.
    pub fn delete_record(&mut self, id: i64, confirmed: bool) -> Option<Pending> {
        if !confirmed {
            tracing::debug!("Delete of record {} not confirmed", id);
            return None;
        }
        Some(self.call(Request::DeleteYield(id)))
    }

    fn finish_delete(&mut self, id: i64, result: AppResult<()>) -> Pending {
        match result {
            Ok(()) => {
                if self.selected_record_id == Some(id) {
                    self.cancel_edit();
                }
                self.status_message = "Record deleted".to_string();
                self.refresh_records()
            }
            Err(e) => {
                tracing::warn!("Failed to delete record {}: {}", id, e);
                let message = match e {
                    AppError::Http { .. } | AppError::Domain(_) => "Failed to delete record",
                    _ => "Error deleting record",
                };
                self.status_message = message.to_string();
                self.notify(NewNotification::error(
                    NotificationCategory::System,
                    "Delete Failed",
                    message,
                ));
                Pending::none()
            }
        }
    }

    // ------------------------------------------------------------------------
    // Form, search and layers
    // ------------------------------------------------------------------------

    pub fn search_location(&mut self, query: &str) -> Pending {
        let query = query.trim();
        if query.is_empty() {
            return Pending::none();
        }
        self.call(Request::Geocode(query.to_string()))
    }

    fn finish_search(&mut self, query: &str, result: AppResult<Option<GeocodeHit>>) {
        match result {
            Ok(Some(hit)) => {
                let name = hit.short_name().to_string();
                self.adapter.center_on(&mut self.scene, hit.position);
                self.status_message = format!("Found: {}", name);
                self.notify(NewNotification::success(
                    NotificationCategory::Activity,
                    "Location Found",
                    format!("Map centered on {}.", name),
                ));
            }
            Ok(None) => {
                self.status_message = "Location not found.".to_string();
                self.notify(NewNotification::warning(
                    NotificationCategory::System,
                    "Location Not Found",
                    "Could not find the specified location.",
                ));
            }
            Err(e) => {
                tracing::warn!("Geocoding '{}' failed: {}", query, e);
                self.status_message = "Error searching for location.".to_string();
                self.notify(NewNotification::error(
                    NotificationCategory::System,
                    "Search Error",
                    "Failed to search for location.",
                ));
            }
        }
    }

    pub fn update_form(&mut self, patch: ForecastFormPatch) -> Pending {
        let previous_window = self.form.window();
        if !self.form.apply(patch) {
            return Pending::none();
        }
        if self.form.window() != previous_window {
            // Tiles were computed for the old date range
            self.zone_revision += 1;
            self.layers.invalidate();
            self.sync_tiles();
        }
        self.refresh_visualization()
    }

    /// Flip a layer's visibility; returns the new visibility
    pub fn toggle_layer(&mut self, parameter: &IndexParameter) -> AppResult<bool> {
        let visible = self
            .layers
            .toggle(parameter)
            .ok_or_else(|| AppError::NotFound(format!("Layer {}", parameter)))?;
        self.sync_tiles();
        Ok(visible)
    }

    pub fn set_layer_opacity(&mut self, parameter: &IndexParameter, opacity: f64) -> AppResult<f64> {
        validate_opacity(opacity).map_err(|m| AppError::validation("opacity", m))?;
        let applied = self
            .layers
            .set_opacity(parameter, opacity)
            .ok_or_else(|| AppError::NotFound(format!("Layer {}", parameter)))?;
        self.sync_tiles();
        Ok(applied)
    }

    fn refresh_visualization(&mut self) -> Pending {
        let parameter = self.form.parameter.clone();
        self.fetch_visualization(parameter)
    }

    /// Request an index tile layer for the current zone. Failures are only logged.
    pub fn fetch_visualization(&mut self, parameter: IndexParameter) -> Pending {
        let Some(geometry) = self.geometry.clone() else {
            return Pending::none();
        };
        self.call(Request::Visualization(VisualizationRequest {
            geometry,
            start_date: self.form.start_date,
            end_date: self.form.end_date,
            parameter,
        }))
    }

    fn finish_visualization(&mut self, parameter: IndexParameter, result: AppResult<Option<String>>) {
        match result {
            Ok(Some(url)) => {
                tracing::debug!("{} tiles: {}", parameter, url);
                self.layers.show_tiles(parameter, url);
                self.sync_tiles();
            }
            Ok(None) => tracing::debug!("No {} tiles for this zone", parameter),
            Err(e) => tracing::warn!("Error fetching {} visualization: {}", parameter, e),
        }
    }

    fn sync_tiles(&mut self) {
        self.tiles.sync(&mut self.scene, &self.layers);
    }
}

impl Drop for DashboardController {
    fn drop(&mut self) {
        self.stop_poller();
    }
}

fn fresh_form(settings: &ControllerSettings) -> ForecastForm {
    ForecastForm {
        parameter: settings.default_parameter.clone(),
        ..ForecastForm::default()
    }
}
