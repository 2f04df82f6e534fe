//! Forecast status poller
//!
//! Runs as its own task and never touches the dashboard store: every
//! observation is sent as a [`PollEvent`] tagged with the generation of the run
//! that spawned it, and the store decides whether the event is still current.

use std::sync::Arc;
use std::time::Duration;

use shared::StatusOutcome;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use crate::external::ForecastBackend;

/// Timing of the status poll loop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Job still queued or running; carries the backend's message
    Progress(String),
    Completed,
    Failed(String),
    /// Attempts exhausted without a terminal status
    TimedOut,
}

impl PollOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollOutcome::Progress(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollEvent {
    pub generation: u64,
    pub outcome: PollOutcome,
}

/// Spawn the poll loop for one forecast run
pub fn spawn_status_poller(
    backend: Arc<dyn ForecastBackend>,
    generation: u64,
    settings: PollSettings,
    events: UnboundedSender<PollEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let outcome = poll_until_done(backend.as_ref(), settings, |message| {
            let _ = events.send(PollEvent {
                generation,
                outcome: PollOutcome::Progress(message),
            });
        })
        .await;
        tracing::info!("Forecast poller #{} finished: {:?}", generation, outcome);
        let _ = events.send(PollEvent {
            generation,
            outcome,
        });
    })
}

/// Poll `GET /api/forecast/status` until a terminal status or the attempt bound.
///
/// A status call that fails counts as an attempt. `idle` after the job was
/// seen running means the job finished and its status was already reset.
pub async fn poll_until_done<F>(
    backend: &dyn ForecastBackend,
    settings: PollSettings,
    mut on_progress: F,
) -> PollOutcome
where
    F: FnMut(String) + Send,
{
    let mut seen_running = false;
    let mut last_message: Option<String> = None;

    for attempt in 1..=settings.max_attempts {
        tokio::time::sleep(settings.interval).await;

        let status = match backend.forecast_status().await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!("Status poll {} failed: {}", attempt, e);
                continue;
            }
        };
        tracing::debug!(
            "Status poll {}/{}: running={} message={}",
            attempt,
            settings.max_attempts,
            status.running,
            status.message
        );

        match status.outcome() {
            StatusOutcome::Completed => return PollOutcome::Completed,
            StatusOutcome::Failed(reason) => return PollOutcome::Failed(reason),
            StatusOutcome::Idle if seen_running => return PollOutcome::Completed,
            StatusOutcome::Idle => {}
            StatusOutcome::Pending => {
                seen_running |= status.running;
                if last_message.as_deref() != Some(status.message.as_str()) {
                    on_progress(status.message.clone());
                    last_message = Some(status.message);
                }
            }
        }
    }

    PollOutcome::TimedOut
}
