//! Dashboard services: the forecast lifecycle store, the backend calls it
//! hands out and its status poller

pub mod lifecycle;
pub mod pending;
pub mod poller;

pub use lifecycle::{
    ControllerSettings, DashboardController, DashboardSnapshot, LifecyclePhase, TIMEOUT_MESSAGE,
};
pub use pending::{BackendCall, BackendReply, Pending};
pub use poller::{poll_until_done, spawn_status_poller, PollEvent, PollOutcome, PollSettings};
