// src/services/notification_service.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing;

use crate::{
    errors::{ResqError, ResqResult},
    models::{
        notification::{Notification, NotificationCategory, NotificationView},
        request::{AidRequest, Location, Urgency},
        volunteer::Volunteer,
    },
    utils::id_generator::{IdType, WithGeneratedId},
};

/// Somewhere a feed event is forwarded to after it is recorded.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    fn name(&self) -> &'static str;
    async fn dispatch(&self, notification: &Notification) -> ResqResult<()>;
}

/// Posts each event as JSON to an operator-configured URL.
pub struct WebhookDispatcher {
    client: reqwest::Client,
    url: String,
}

impl WebhookDispatcher {
    pub fn new(url: impl Into<String>) -> ResqResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(ResqError::from)?;
        Ok(Self { client, url: url.into() })
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookDispatcher {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn dispatch(&self, notification: &Notification) -> ResqResult<()> {
        let response = self.client.post(&self.url).json(notification).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ResqError::WebhookDelivery(format!("{}: {}", status, body)));
        }

        tracing::debug!("Webhook delivered notification {}", notification.id);
        Ok(())
    }
}

/// Used when no webhook is configured.
#[derive(Debug)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn dispatch(&self, notification: &Notification) -> ResqResult<()> {
        tracing::info!(
            "[FEED] {:?}: {}",
            notification.category,
            notification.message
        );
        Ok(())
    }
}

/// Bounded, append-only list of operator events; oldest entries fall off.
pub struct NotificationFeed {
    entries: RwLock<VecDeque<Notification>>,
    capacity: usize,
}

impl NotificationFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
        }
    }

    pub async fn append(&self, notification: Notification) {
        let mut entries = self.entries.write().await;
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(notification);
    }

    /// Newest first.
    pub async fn recent(&self, limit: usize) -> Vec<Notification> {
        self.entries.read().await.iter().rev().take(limit).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

pub struct NotificationService {
    feed: NotificationFeed,
    dispatchers: Vec<Arc<dyn NotificationDispatcher>>,
}

impl NotificationService {
    pub fn new(capacity: usize, dispatchers: Vec<Arc<dyn NotificationDispatcher>>) -> Self {
        Self {
            feed: NotificationFeed::new(capacity),
            dispatchers,
        }
    }

    /// Records an event, then forwards it. Forwarding failures are logged and
    /// never surface to the caller.
    pub async fn publish(
        &self,
        category: NotificationCategory,
        message: impl Into<String>,
        request_id: Option<&str>,
    ) -> Notification {
        let notification = Notification {
            id: String::new(),
            category,
            message: message.into(),
            request_id: request_id.map(str::to_string),
            created_at: Utc::now(),
        }
        .with_generated_id(IdType::Notification);

        self.record(notification.clone()).await;

        let deliveries = self.dispatchers.iter().map(|d| {
            let notification = &notification;
            async move { (d.name(), d.dispatch(notification).await) }
        });
        for (name, result) in join_all(deliveries).await {
            if let Err(e) = result {
                tracing::warn!("Dispatcher {} failed for {}: {}", name, notification.id, e);
            }
        }

        notification
    }

    /// Adds an entry to the feed without forwarding it (used for seeding).
    pub async fn record(&self, notification: Notification) {
        self.feed.append(notification).await;
    }

    pub async fn recent(&self, limit: usize, now: DateTime<Utc>) -> Vec<NotificationView> {
        self.feed
            .recent(limit)
            .await
            .into_iter()
            .map(|n| n.view(now))
            .collect()
    }

    pub async fn notify_request_created(&self, request: &AidRequest) -> Notification {
        let place = describe_location(&request.location);
        match request.urgency {
            Urgency::High => {
                self.publish(
                    NotificationCategory::Urgent,
                    format!("New high-priority {} request in {}", request.aid_type, place),
                    Some(&request.id),
                )
                .await
            }
            _ => {
                self.publish(
                    NotificationCategory::Info,
                    format!("New {} request in {}", request.aid_type, place),
                    Some(&request.id),
                )
                .await
            }
        }
    }

    pub async fn notify_request_accepted(&self, request: &AidRequest, volunteer_label: &str) -> Notification {
        self.publish(
            NotificationCategory::Info,
            format!(
                "{} accepted the {} request in {}",
                volunteer_label,
                request.aid_type,
                describe_location(&request.location)
            ),
            Some(&request.id),
        )
        .await
    }

    pub async fn notify_volunteer_assigned(&self, request: &AidRequest, volunteer: &Volunteer) -> Notification {
        self.publish(
            NotificationCategory::Info,
            format!(
                "{} assigned to the {} request in {}",
                volunteer.name,
                request.aid_type,
                describe_location(&request.location)
            ),
            Some(&request.id),
        )
        .await
    }

    pub async fn notify_request_completed(&self, request: &AidRequest) -> Notification {
        self.publish(
            NotificationCategory::Success,
            format!(
                "{} relief operation in {} completed",
                request.aid_type,
                describe_location(&request.location)
            ),
            Some(&request.id),
        )
        .await
    }

    pub async fn notify_volunteer_registered(&self, volunteer: &Volunteer) -> Notification {
        self.publish(
            NotificationCategory::Info,
            format!("Volunteer {} registered ({})", volunteer.name, volunteer.role),
            None,
        )
        .await
    }
}

fn describe_location(location: &Location) -> String {
    match (location.address(), location.point()) {
        (Some(address), _) => address.to_string(),
        (None, Some(point)) => format!("{:.4}, {:.4}", point.latitude, point.longitude),
        (None, None) => "unknown location".to_string(),
    }
}
