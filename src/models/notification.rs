// src/models/notification.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationCategory {
    Urgent,  // "New high-priority request in Mumbai"
    Info,    // "5 volunteers registered today"
    Success, // "Chennai relief operation completed"
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Notification {
    pub id: String,
    pub category: NotificationCategory,
    pub message: String,
    pub request_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Feed entry as shown to operators, with the relative time rendered.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NotificationView {
    #[serde(flatten)]
    pub notification: Notification,
    pub time: String,
}

impl Notification {
    pub fn view(self, now: DateTime<Utc>) -> NotificationView {
        let time = relative_time(self.created_at, now);
        NotificationView {
            notification: self,
            time,
        }
    }
}

/// "Just now", "10 min ago", "1 hour ago", "3 hours ago", "1 day ago".
pub fn relative_time(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{} min ago", minutes)
    } else if hours < 24 {
        format!("{} {} ago", hours, if hours == 1 { "hour" } else { "hours" })
    } else {
        format!("{} {} ago", days, if days == 1 { "day" } else { "days" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_relative_time() {
        let now = Utc::now();
        assert_eq!(relative_time(now, now), "Just now");
        assert_eq!(relative_time(now - Duration::minutes(10), now), "10 min ago");
        assert_eq!(relative_time(now - Duration::minutes(60), now), "1 hour ago");
        assert_eq!(relative_time(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(relative_time(now - Duration::hours(26), now), "1 day ago");
    }

    #[test]
    fn test_view_serializes_flat() {
        let now = Utc::now();
        let view = Notification {
            id: "not-250612-abc12".into(),
            category: NotificationCategory::Urgent,
            message: "New high-priority request in Mumbai".into(),
            request_id: None,
            created_at: now - Duration::minutes(10),
        }
        .view(now);
        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["category"], "urgent");
        assert_eq!(value["time"], "10 min ago");
        assert_eq!(value["message"], "New high-priority request in Mumbai");
    }
}
