//! In-memory notification log for the dashboard's alerts panel
//!
//! The log is append-only: dismissing hides an entry from views but keeps it
//! in memory, and "clear all" dismisses everything rather than deleting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Success,
    Warning,
    Error,
    Info,
}

/// Panel tab a notification is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    System,
    Crop,
    Weather,
    Activity,
}

/// Category filter applied when reading the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NotificationFilter {
    #[default]
    All,
    System,
    Crop,
    Weather,
    Activity,
}

impl NotificationFilter {
    pub fn matches(&self, category: NotificationCategory) -> bool {
        match self {
            NotificationFilter::All => true,
            NotificationFilter::System => category == NotificationCategory::System,
            NotificationFilter::Crop => category == NotificationCategory::Crop,
            NotificationFilter::Weather => category == NotificationCategory::Weather,
            NotificationFilter::Activity => category == NotificationCategory::Activity,
        }
    }
}

/// A single user-facing event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub category: NotificationCategory,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub dismissed: bool,
}

/// What a caller supplies; id, timestamp and dismissal are assigned by the log
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub kind: NotificationType,
    pub category: NotificationCategory,
    pub title: String,
    pub message: String,
}

impl NewNotification {
    pub fn new(
        kind: NotificationType,
        category: NotificationCategory,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            category,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn success(category: NotificationCategory, title: &str, message: impl Into<String>) -> Self {
        Self::new(NotificationType::Success, category, title, message)
    }

    pub fn info(category: NotificationCategory, title: &str, message: impl Into<String>) -> Self {
        Self::new(NotificationType::Info, category, title, message)
    }

    pub fn warning(category: NotificationCategory, title: &str, message: impl Into<String>) -> Self {
        Self::new(NotificationType::Warning, category, title, message)
    }

    pub fn error(category: NotificationCategory, title: &str, message: impl Into<String>) -> Self {
        Self::new(NotificationType::Error, category, title, message)
    }
}

/// Newest-first notification log
#[derive(Debug, Clone, Default, Serialize)]
pub struct NotificationLog {
    entries: Vec<Notification>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a notification stamped with the current time
    pub fn push(&mut self, notification: NewNotification) -> Uuid {
        self.push_at(notification, Utc::now())
    }

    /// Append a notification with an explicit timestamp
    pub fn push_at(&mut self, notification: NewNotification, timestamp: DateTime<Utc>) -> Uuid {
        let id = Uuid::new_v4();
        self.entries.insert(
            0,
            Notification {
                id,
                kind: notification.kind,
                category: notification.category,
                title: notification.title,
                message: notification.message,
                timestamp,
                dismissed: false,
            },
        );
        id
    }

    /// Soft-dismiss one entry. Returns false for an unknown id.
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        match self.entries.iter_mut().find(|n| n.id == id) {
            Some(entry) => {
                entry.dismissed = true;
                true
            }
            None => false,
        }
    }

    /// Dismiss every entry; nothing is removed from memory
    pub fn clear_all(&mut self) {
        for entry in &mut self.entries {
            entry.dismissed = true;
        }
    }

    /// Visible (not dismissed) entries matching the filter, newest first
    pub fn visible(&self, filter: NotificationFilter) -> Vec<&Notification> {
        self.entries
            .iter()
            .filter(|n| !n.dismissed && filter.matches(n.category))
            .collect()
    }

    /// Every entry, dismissed or not
    pub fn all(&self) -> &[Notification] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Relative age of a timestamp as shown next to each notification
pub fn format_relative_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - timestamp).num_minutes();
    if minutes < 1 {
        return "just now".to_string();
    }
    if minutes < 60 {
        return format!("{}m ago", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{}h ago", hours);
    }
    format!("{}d ago", hours / 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn activity(title: &str) -> NewNotification {
        NewNotification::info(NotificationCategory::Activity, title, "message")
    }

    #[test]
    fn test_newest_first() {
        let mut log = NotificationLog::new();
        log.push(activity("first"));
        log.push(activity("second"));

        let visible = log.visible(NotificationFilter::All);
        assert_eq!(visible[0].title, "second");
        assert_eq!(visible[1].title, "first");
    }

    #[test]
    fn test_dismiss_hides_but_retains() {
        let mut log = NotificationLog::new();
        let id = log.push(activity("zone created"));
        log.push(activity("zone updated"));

        assert!(log.dismiss(id));
        assert_eq!(log.visible(NotificationFilter::All).len(), 1);
        assert_eq!(log.len(), 2);
        assert!(log.all().iter().any(|n| n.id == id && n.dismissed));
    }

    #[test]
    fn test_dismiss_unknown_id() {
        let mut log = NotificationLog::new();
        assert!(!log.dismiss(Uuid::new_v4()));
    }

    #[test]
    fn test_clear_all_then_add_shows_only_new() {
        let mut log = NotificationLog::new();
        log.push(activity("a"));
        log.push(activity("b"));
        log.clear_all();
        log.push(activity("c"));

        let visible = log.visible(NotificationFilter::All);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "c");
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn test_category_filter() {
        let mut log = NotificationLog::new();
        log.push(NewNotification::success(NotificationCategory::Crop, "Forecast Complete", "done"));
        log.push(NewNotification::error(NotificationCategory::System, "Network Error", "down"));
        log.push(activity("Zone Created"));

        assert_eq!(log.visible(NotificationFilter::Crop).len(), 1);
        assert_eq!(log.visible(NotificationFilter::System).len(), 1);
        assert_eq!(log.visible(NotificationFilter::Weather).len(), 0);
        assert_eq!(log.visible(NotificationFilter::All).len(), 3);
    }

    #[test]
    fn test_relative_age() {
        let now = Utc::now();
        assert_eq!(format_relative_age(now, now), "just now");
        assert_eq!(format_relative_age(now - Duration::seconds(59), now), "just now");
        assert_eq!(format_relative_age(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(format_relative_age(now - Duration::minutes(59), now), "59m ago");
        assert_eq!(format_relative_age(now - Duration::minutes(60), now), "1h ago");
        assert_eq!(format_relative_age(now - Duration::hours(23), now), "23h ago");
        assert_eq!(format_relative_age(now - Duration::hours(49), now), "2d ago");
    }

    #[test]
    fn test_serialized_shape() {
        let mut log = NotificationLog::new();
        log.push(NewNotification::warning(
            NotificationCategory::System,
            "Missing Zone Name",
            "Please enter a name for the zone.",
        ));
        let json = serde_json::to_value(&log.all()[0]).unwrap();
        assert_eq!(json["type"], "warning");
        assert_eq!(json["category"], "system");
        assert_eq!(json["dismissed"], false);
    }
}
