//! HTTP handlers for the notifications panel

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use shared::{format_relative_age, Notification, NotificationFilter};
use uuid::Uuid;

use crate::error::AppResult;
use crate::AppState;

/// Query parameters for listing notifications
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    #[serde(default)]
    pub category: NotificationFilter,
}

/// A notification with its age rendered at request time
#[derive(Debug, Serialize)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub age: String,
}

/// Visible notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<ListNotificationsQuery>,
) -> Json<Vec<NotificationView>> {
    let controller = state.controller.lock().await;
    let now = Utc::now();
    let views = controller
        .notifications()
        .visible(query.category)
        .into_iter()
        .rev()
        .map(|n| NotificationView {
            age: format_relative_age(n.timestamp, now),
            notification: n.clone(),
        })
        .collect();
    Json(views)
}

#[derive(Debug, Serialize)]
pub struct DismissResponse {
    pub dismissed: Uuid,
}

pub async fn dismiss_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<DismissResponse>> {
    state.controller.lock().await.dismiss_notification(id)?;
    Ok(Json(DismissResponse { dismissed: id }))
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
}

/// Dismiss everything; entries stay in memory
pub async fn clear_notifications(State(state): State<AppState>) -> Json<ClearResponse> {
    state.controller.lock().await.clear_notifications();
    Json(ClearResponse { cleared: true })
}
