//! Backend calls left over by controller operations
//!
//! Operations on [`DashboardController`] only touch in-memory state. When one
//! needs the backend or the geocoder it returns a [`Pending`] list instead of
//! awaiting the call itself. The caller sends each call without holding the
//! controller and hands the reply back through
//! [`DashboardController::apply_reply`], which may queue follow-up calls.

use std::collections::VecDeque;
use std::sync::Arc;

use shared::{
    AvailabilityRequest, DataAvailability, ForecastRunRequest, IndexParameter,
    VisualizationRequest, YieldRecord,
};
use tokio::sync::Mutex;

use crate::error::AppResult;
use crate::external::{ForecastBackend, GeocodeHit, Geocoder};
use crate::services::DashboardController;

#[derive(Debug, Clone)]
pub(crate) enum Request {
    ListYields,
    DeleteYield(i64),
    Availability(AvailabilityRequest),
    Visualization(VisualizationRequest),
    RunForecast(ForecastRunRequest),
    Geocode(String),
}

#[derive(Debug)]
pub(crate) enum Reply {
    Yields(AppResult<Vec<YieldRecord>>),
    Deleted(i64, AppResult<()>),
    Availability(AppResult<DataAvailability>),
    Visualization(IndexParameter, AppResult<Option<String>>),
    ForecastStarted(ForecastRunRequest, AppResult<()>),
    Geocoded(String, AppResult<Option<GeocodeHit>>),
}

/// One backend request, tagged with the zone revision it was issued for
pub struct BackendCall {
    pub(crate) request: Request,
    pub(crate) zone: u64,
    pub(crate) backend: Arc<dyn ForecastBackend>,
    pub(crate) geocoder: Arc<dyn Geocoder>,
}

/// Answer to a [`BackendCall`]
#[derive(Debug)]
pub struct BackendReply {
    pub(crate) reply: Reply,
    pub(crate) zone: u64,
}

impl BackendCall {
    pub async fn send(self) -> BackendReply {
        let reply = match self.request {
            Request::ListYields => Reply::Yields(self.backend.list_yields().await),
            Request::DeleteYield(id) => Reply::Deleted(id, self.backend.delete_yield(id).await),
            Request::Availability(request) => {
                Reply::Availability(self.backend.check_availability(&request).await)
            }
            Request::Visualization(request) => {
                let result = self.backend.visualization(&request).await;
                Reply::Visualization(request.parameter, result)
            }
            Request::RunForecast(request) => {
                let result = self.backend.run_forecast(&request).await;
                Reply::ForecastStarted(request, result)
            }
            Request::Geocode(query) => {
                let result = self.geocoder.search(&query).await;
                Reply::Geocoded(query, result)
            }
        };
        BackendReply {
            reply,
            zone: self.zone,
        }
    }
}

impl std::fmt::Debug for BackendCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendCall")
            .field("request", &self.request)
            .field("zone", &self.zone)
            .finish()
    }
}

/// Calls an operation still has to make, in order
#[must_use = "backend calls are only sent when the pending list is completed"]
#[derive(Debug, Default)]
pub struct Pending {
    calls: VecDeque<BackendCall>,
}

impl Pending {
    pub fn none() -> Self {
        Self::default()
    }

    pub(crate) fn one(call: BackendCall) -> Self {
        let mut pending = Self::default();
        pending.calls.push_back(call);
        pending
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Send every call while owning the controller outright
    pub async fn complete(mut self, controller: &mut DashboardController) {
        while let Some(call) = self.calls.pop_front() {
            let reply = call.send().await;
            let next = controller.apply_reply(reply);
            self.calls.extend(next.calls);
        }
    }

    /// Send every call with the lock released; it is only taken to apply each reply
    pub async fn complete_shared(mut self, controller: &Mutex<DashboardController>) {
        while let Some(call) = self.calls.pop_front() {
            let reply = call.send().await;
            let next = controller.lock().await.apply_reply(reply);
            self.calls.extend(next.calls);
        }
    }
}
