// src/services/matching_service.rs
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing;

use crate::{
    errors::{ResqError, ResqResult},
    models::{
        request::{AidRequest, RequestStatus},
        volunteer::VolunteerStatus,
    },
    services::{
        notification_service::NotificationService,
        request_service::RequestLock,
        store_service::{RequestRepository, Store, VolunteerRepository},
    },
    utils::id_generator::{IdGenerator, IdType},
};

#[async_trait]
pub trait MatchingOperations: Send + Sync {
    async fn accept_request(&self, request_id: &str, volunteer_id: &str) -> ResqResult<AidRequest>;
    async fn assign_volunteer(&self, request_id: &str, volunteer_id: &str) -> ResqResult<AidRequest>;
    async fn complete_request(&self, request_id: &str) -> ResqResult<AidRequest>;
}

pub struct MatchingService {
    store: Arc<Store>,
    notification_service: Arc<NotificationService>,
    lock: RequestLock,
}

impl MatchingService {
    pub fn new(store: Arc<Store>, notification_service: Arc<NotificationService>, lock: RequestLock) -> Self {
        Self {
            store,
            notification_service,
            lock,
        }
    }

    async fn find_request(&self, request_id: &str) -> ResqResult<AidRequest> {
        if !IdGenerator::validate_id(request_id, Some(IdType::Request)) {
            return Err(ResqError::request_not_found(request_id));
        }
        self.store
            .get_request(request_id)
            .await?
            .ok_or_else(|| ResqError::request_not_found(request_id))
    }

    fn require_volunteer_id(volunteer_id: &str) -> ResqResult<&str> {
        let volunteer_id = volunteer_id.trim();
        if volunteer_id.is_empty() {
            return Err(ResqError::MissingRequiredField("volunteer_id".to_string()));
        }
        Ok(volunteer_id)
    }

    /// Pending moves to accepted; accepted stays; completed is final.
    fn open_for_help(request: &mut AidRequest) -> ResqResult<()> {
        match request.status {
            RequestStatus::Pending => {
                request.status = request.status.transition_to(RequestStatus::Accepted)?;
                Ok(())
            }
            RequestStatus::Accepted => Ok(()),
            RequestStatus::Completed => Err(ResqError::InvalidTransition {
                from: RequestStatus::Completed.to_string(),
                to: RequestStatus::Accepted.to_string(),
            }),
        }
    }
}

#[async_trait]
impl MatchingOperations for MatchingService {
    async fn accept_request(&self, request_id: &str, volunteer_id: &str) -> ResqResult<AidRequest> {
        let volunteer_id = Self::require_volunteer_id(volunteer_id)?;
        tracing::info!("Volunteer {} accepting request {}", volunteer_id, request_id);

        let guard = self.lock.lock().await;
        let mut request = self.find_request(request_id).await?;

        if request.volunteers.iter().any(|v| v == volunteer_id) {
            tracing::debug!("Volunteer {} already on request {}", volunteer_id, request_id);
            return Ok(request);
        }
        Self::open_for_help(&mut request)?;
        request.engage_volunteer(volunteer_id);
        request.updated_at = Utc::now();
        self.store.replace_request(&request).await?;
        drop(guard);

        // Volunteers accepting from the board need not be registered.
        let label = match self.store.get_volunteer(volunteer_id).await? {
            Some(volunteer) => volunteer.name,
            None => format!("Volunteer {}", volunteer_id),
        };
        self.notification_service.notify_request_accepted(&request, &label).await;

        tracing::info!("Request {} accepted, {} responses", request.id, request.responses);
        Ok(request)
    }

    async fn assign_volunteer(&self, request_id: &str, volunteer_id: &str) -> ResqResult<AidRequest> {
        let volunteer_id = Self::require_volunteer_id(volunteer_id)?;
        tracing::info!("Assigning volunteer {} to request {}", volunteer_id, request_id);

        let guard = self.lock.lock().await;
        let mut request = self.find_request(request_id).await?;
        let mut volunteer = self
            .store
            .get_volunteer(volunteer_id)
            .await?
            .ok_or_else(|| ResqError::volunteer_not_found(volunteer_id))?;

        if !volunteer.is_available() {
            return Err(ResqError::VolunteerNotAvailable(volunteer.id));
        }
        Self::open_for_help(&mut request)?;

        request.assign_volunteer(&volunteer.id);
        if request.helper.is_none() {
            request.helper = Some(volunteer.name.clone());
        }
        request.updated_at = Utc::now();
        volunteer.status = VolunteerStatus::Busy;

        self.store.replace_request(&request).await?;
        self.store.save_volunteer(&volunteer).await?;
        drop(guard);

        self.notification_service.notify_volunteer_assigned(&request, &volunteer).await;

        tracing::info!("Volunteer {} assigned to request {}", volunteer.id, request.id);
        Ok(request)
    }

    async fn complete_request(&self, request_id: &str) -> ResqResult<AidRequest> {
        tracing::info!("Completing request: {}", request_id);

        let guard = self.lock.lock().await;
        let mut request = self.find_request(request_id).await?;
        request.status = request.status.transition_to(RequestStatus::Completed)?;
        request.updated_at = Utc::now();
        self.store.replace_request(&request).await?;

        // Only assignees were marked busy by this request, and only those no
        // other open assignment still holds go back to available.
        let still_held: HashSet<String> = self
            .store
            .list_requests()
            .await?
            .into_iter()
            .filter(|other| other.id != request.id && other.status == RequestStatus::Accepted)
            .flat_map(|other| other.assignees)
            .collect();

        for volunteer_id in request.assignees.iter().filter(|id| !still_held.contains(*id)) {
            match self.store.get_volunteer(volunteer_id).await? {
                Some(mut volunteer) if volunteer.status == VolunteerStatus::Busy => {
                    volunteer.status = VolunteerStatus::Available;
                    self.store.save_volunteer(&volunteer).await?;
                    tracing::debug!("Volunteer {} freed", volunteer.id);
                }
                _ => {}
            }
        }
        drop(guard);

        self.notification_service.notify_request_completed(&request).await;
        tracing::info!("Request completed: {}", request.id);
        Ok(request)
    }
}
