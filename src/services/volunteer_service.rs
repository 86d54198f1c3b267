// src/services/volunteer_service.rs
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing;

use crate::{
    errors::{ResqError, ResqResult},
    models::volunteer::{AvailabilityStats, Volunteer, VolunteerRegistration, VolunteerStatus},
    services::{
        notification_service::NotificationService,
        request_service::RequestLock,
        store_service::{Store, VolunteerRepository},
    },
    utils::id_generator::{IdType, WithGeneratedId},
};

#[async_trait]
pub trait VolunteerOperations: Send + Sync {
    async fn register_volunteer(&self, registration: VolunteerRegistration) -> ResqResult<Volunteer>;
    async fn get_volunteer(&self, volunteer_id: &str) -> ResqResult<Volunteer>;
    async fn list_volunteers(&self, status: Option<VolunteerStatus>) -> ResqResult<Vec<Volunteer>>;
    async fn update_status(&self, volunteer_id: &str, status: VolunteerStatus) -> ResqResult<Volunteer>;
    async fn availability_stats(&self) -> ResqResult<AvailabilityStats>;
}

pub struct VolunteerService {
    store: Arc<Store>,
    notification_service: Arc<NotificationService>,
    lock: RequestLock,
}

impl VolunteerService {
    pub fn new(store: Arc<Store>, notification_service: Arc<NotificationService>, lock: RequestLock) -> Self {
        Self {
            store,
            notification_service,
            lock,
        }
    }
}

#[async_trait]
impl VolunteerOperations for VolunteerService {
    async fn register_volunteer(&self, registration: VolunteerRegistration) -> ResqResult<Volunteer> {
        registration.validate()?;
        tracing::info!("Registering volunteer: {}", registration.name.trim());

        let volunteer = registration.into_volunteer(Utc::now()).with_generated_id(IdType::Volunteer);
        self.store.save_volunteer(&volunteer).await?;
        self.notification_service.notify_volunteer_registered(&volunteer).await;

        tracing::info!("Volunteer registered: {}", volunteer.id);
        Ok(volunteer)
    }

    async fn get_volunteer(&self, volunteer_id: &str) -> ResqResult<Volunteer> {
        tracing::debug!("Getting volunteer: {}", volunteer_id);
        self.store
            .get_volunteer(volunteer_id)
            .await?
            .ok_or_else(|| ResqError::volunteer_not_found(volunteer_id))
    }

    async fn list_volunteers(&self, status: Option<VolunteerStatus>) -> ResqResult<Vec<Volunteer>> {
        let volunteers = self.store.list_volunteers().await?;
        Ok(match status {
            Some(status) => volunteers.into_iter().filter(|v| v.status == status).collect(),
            None => volunteers,
        })
    }

    async fn update_status(&self, volunteer_id: &str, status: VolunteerStatus) -> ResqResult<Volunteer> {
        // Shares the request lock so an assignment never sees a stale status.
        let _guard = self.lock.lock().await;
        let mut volunteer = self.get_volunteer(volunteer_id).await?;
        if volunteer.status != status {
            volunteer.status = status;
            self.store.save_volunteer(&volunteer).await?;
            tracing::info!("Volunteer {} is now {}", volunteer.id, status);
        }
        Ok(volunteer)
    }

    async fn availability_stats(&self) -> ResqResult<AvailabilityStats> {
        let volunteers = self.store.list_volunteers().await?;
        Ok(AvailabilityStats::from_volunteers(&volunteers))
    }
}
