// src/state.rs
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    config::{AppConfig, StoreBackend},
    errors::ResqResult,
    seed,
    services::{
        matching_service::MatchingService,
        notification_service::{LogDispatcher, NotificationDispatcher, NotificationService, WebhookDispatcher},
        request_service::{RequestLock, RequestService},
        store_service::Store,
        volunteer_service::VolunteerService,
    },
};

pub struct AppState {
    pub request_service: Arc<RequestService>,
    pub matching_service: Arc<MatchingService>,
    pub volunteer_service: Arc<VolunteerService>,
    pub notification_service: Arc<NotificationService>,
    pub store: Arc<Store>,
    pub config: AppConfig,
}

impl AppState {
    pub async fn new(config: AppConfig) -> ResqResult<Arc<Self>> {
        let store = match &config.store {
            StoreBackend::Memory => Store::memory(),
            StoreBackend::Redis(url) => Store::redis(url).await?,
        };
        tracing::info!("Using {} store", store.backend_name());

        let dispatcher: Arc<dyn NotificationDispatcher> = match &config.webhook_url {
            Some(url) => Arc::new(WebhookDispatcher::new(url.clone())?),
            None => {
                tracing::warn!("RESQNET_WEBHOOK_URL not set, notifications are only logged");
                Arc::new(LogDispatcher)
            }
        };

        let state = Self::assemble(config, Arc::new(store), vec![dispatcher]);
        if state.config.seed_demo {
            seed::seed_demo_data(&state.store, &state.notification_service).await?;
        }
        Ok(state)
    }

    fn assemble(config: AppConfig, store: Arc<Store>, dispatchers: Vec<Arc<dyn NotificationDispatcher>>) -> Arc<Self> {
        let notification_service = Arc::new(NotificationService::new(config.feed_capacity, dispatchers));
        let lock: RequestLock = Arc::new(Mutex::new(()));

        let request_service = Arc::new(RequestService::new(
            store.clone(),
            notification_service.clone(),
            lock.clone(),
        ));
        let matching_service = Arc::new(MatchingService::new(
            store.clone(),
            notification_service.clone(),
            lock.clone(),
        ));
        let volunteer_service = Arc::new(VolunteerService::new(store.clone(), notification_service.clone(), lock));

        Arc::new(Self {
            request_service,
            matching_service,
            volunteer_service,
            notification_service,
            store,
            config,
        })
    }

    /// Fresh in-memory state with no dispatchers.
    pub fn in_memory() -> Arc<Self> {
        Self::assemble(AppConfig::default(), Arc::new(Store::memory()), Vec::new())
    }
}
