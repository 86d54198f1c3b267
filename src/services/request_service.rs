// src/services/request_service.rs
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing;

use crate::{
    errors::{ResqError, ResqResult},
    models::request::{AidRequest, NewAidRequest, StatusStats, UrgencyBreakdown},
    services::{
        filter::RequestFilter,
        notification_service::NotificationService,
        store_service::{RequestRepository, Store},
    },
    utils::id_generator::{IdGenerator, IdType, WithGeneratedId},
};

/// Attempts at finding an unused request id before giving up.
const ID_ATTEMPTS: usize = 3;

/// Serializes read-modify-write cycles on stored requests.
pub type RequestLock = Arc<Mutex<()>>;

/// Result of an intake call; `created` is false when an idempotency key
/// matched an earlier submission.
#[derive(Debug, Clone)]
pub struct IntakeOutcome {
    pub request: AidRequest,
    pub created: bool,
}

#[async_trait]
pub trait RequestOperations: Send + Sync {
    async fn create_request(&self, request: NewAidRequest, idempotency_key: Option<String>) -> ResqResult<IntakeOutcome>;
    async fn get_request(&self, request_id: &str) -> ResqResult<AidRequest>;
    async fn list_requests(&self, filter: &RequestFilter) -> ResqResult<Vec<AidRequest>>;
    async fn update_request(&self, request_id: &str, update: NewAidRequest) -> ResqResult<AidRequest>;
    async fn delete_request(&self, request_id: &str) -> ResqResult<()>;
    async fn status_stats(&self) -> ResqResult<StatusStats>;
    async fn urgency_breakdown(&self) -> ResqResult<UrgencyBreakdown>;
}

pub struct RequestService {
    store: Arc<Store>,
    notification_service: Arc<NotificationService>,
    lock: RequestLock,
}

impl RequestService {
    pub fn new(store: Arc<Store>, notification_service: Arc<NotificationService>, lock: RequestLock) -> Self {
        Self {
            store,
            notification_service,
            lock,
        }
    }

    /// Inserts under the draft's id, regenerating it on collision.
    async fn insert_with_fresh_id(&self, mut request: AidRequest) -> ResqResult<AidRequest> {
        for _ in 0..ID_ATTEMPTS {
            match self.store.insert_request(&request).await {
                Ok(()) => return Ok(request),
                Err(ResqError::Conflict(_)) => {
                    tracing::warn!("Request id collision on {}, regenerating", request.id);
                    request.set_generated_id(IdType::Request);
                }
                Err(e) => return Err(e),
            }
        }
        Err(ResqError::internal_error("could not allocate a unique request id"))
    }

    async fn find(&self, request_id: &str) -> ResqResult<AidRequest> {
        if !IdGenerator::validate_id(request_id, Some(IdType::Request)) {
            tracing::debug!("Rejecting malformed request id: {}", request_id);
            return Err(ResqError::request_not_found(request_id));
        }
        self.store
            .get_request(request_id)
            .await?
            .ok_or_else(|| ResqError::request_not_found(request_id))
    }

    /// Returns the earlier request if `key` was already used, binding it to
    /// `reserved_id` otherwise.
    async fn replay(&self, key: &str, reserved_id: &str) -> ResqResult<Option<AidRequest>> {
        match self.store.claim_idempotency_key(key, reserved_id).await? {
            None => Ok(None),
            Some(existing_id) => match self.store.get_request(&existing_id).await? {
                Some(existing) => Ok(Some(existing)),
                None => {
                    // The earlier request was deleted; let the key start over.
                    self.store.release_idempotency_key(key).await?;
                    self.store.claim_idempotency_key(key, reserved_id).await?;
                    Ok(None)
                }
            },
        }
    }
}

#[async_trait]
impl RequestOperations for RequestService {
    async fn create_request(&self, request: NewAidRequest, idempotency_key: Option<String>) -> ResqResult<IntakeOutcome> {
        let (aid_type, location) = request.validate()?;
        tracing::info!("Intake of {} request", aid_type);

        let draft = AidRequest::from_new(request, aid_type, location, Utc::now()).with_generated_id(IdType::Request);

        let key = idempotency_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty());
        // Keyed submissions hold the lock until the request is stored, so a
        // concurrent retry with the same key sees it.
        let guard = match &key {
            Some(_) => Some(self.lock.lock().await),
            None => None,
        };

        if let Some(key) = &key {
            if let Some(existing) = self.replay(key, &draft.id).await? {
                tracing::info!("Idempotency key {} replayed request {}", key, existing.id);
                return Ok(IntakeOutcome {
                    request: existing,
                    created: false,
                });
            }
        }

        let reserved_id = draft.id.clone();
        let stored = match self.insert_with_fresh_id(draft).await {
            Ok(stored) => stored,
            Err(e) => {
                if let Some(key) = &key {
                    self.store.release_idempotency_key(key).await?;
                }
                return Err(e);
            }
        };
        if let Some(key) = &key {
            if stored.id != reserved_id {
                self.store.release_idempotency_key(key).await?;
                self.store.claim_idempotency_key(key, &stored.id).await?;
            }
        }
        drop(guard);

        self.notification_service.notify_request_created(&stored).await;
        tracing::info!("Aid request created: {} ({})", stored.id, stored.reference_code);

        Ok(IntakeOutcome {
            request: stored,
            created: true,
        })
    }

    async fn get_request(&self, request_id: &str) -> ResqResult<AidRequest> {
        tracing::debug!("Getting request: {}", request_id);
        self.find(request_id).await
    }

    async fn list_requests(&self, filter: &RequestFilter) -> ResqResult<Vec<AidRequest>> {
        let requests = self.store.list_requests().await?;
        if filter.is_default() {
            return Ok(requests);
        }
        Ok(filter.apply(&requests))
    }

    async fn update_request(&self, request_id: &str, update: NewAidRequest) -> ResqResult<AidRequest> {
        let (aid_type, location) = update.validate_for_edit()?;

        let _guard = self.lock.lock().await;
        let mut request = self.find(request_id).await?;
        if !request.is_pending() {
            return Err(ResqError::RequestLocked(request_id.to_string()));
        }

        let edited = AidRequest::from_new(update, aid_type, location, Utc::now());
        request.aid_type = edited.aid_type;
        request.details = edited.details;
        request.location = edited.location;
        request.urgency = edited.urgency;
        request.contact = edited.contact;
        request.requester = edited.requester.or(request.requester);
        request.required_items = edited.required_items;
        request.updated_at = edited.updated_at;

        self.store.replace_request(&request).await?;
        tracing::info!("Aid request edited in place: {}", request.id);

        Ok(request)
    }

    async fn delete_request(&self, request_id: &str) -> ResqResult<()> {
        let _guard = self.lock.lock().await;
        let request = self.find(request_id).await?;
        if !request.is_pending() {
            return Err(ResqError::RequestLocked(request_id.to_string()));
        }

        self.store.remove_request(request_id).await?;
        tracing::info!("Aid request deleted: {}", request_id);
        Ok(())
    }

    async fn status_stats(&self) -> ResqResult<StatusStats> {
        let requests = self.store.list_requests().await?;
        Ok(StatusStats::from_requests(&requests))
    }

    async fn urgency_breakdown(&self) -> ResqResult<UrgencyBreakdown> {
        let requests = self.store.list_requests().await?;
        Ok(UrgencyBreakdown::from_requests(&requests))
    }
}
