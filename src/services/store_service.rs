// src/services/store_service.rs
use async_trait::async_trait;
use redis::{Client, aio::MultiplexedConnection};
use serde::{Serialize, de::DeserializeOwned};
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing;

use crate::{
    errors::{ResqError, ResqResult},
    models::{request::AidRequest, volunteer::Volunteer},
};

/// How long a client-supplied idempotency key is remembered.
const IDEMPOTENCY_TTL_SECONDS: u64 = 24 * 60 * 60;

// Store key strategies
#[derive(Debug, Clone)]
pub enum StoreKey {
    Simple(String),
    Composite(Vec<String>),
}

impl StoreKey {
    pub fn render(&self) -> String {
        match self {
            StoreKey::Simple(key) => key.clone(),
            StoreKey::Composite(parts) => parts.join(":"),
        }
    }
}

pub struct StoreKeys;

impl StoreKeys {
    pub fn request_by_id(request_id: &str) -> StoreKey {
        StoreKey::Composite(vec!["request".to_string(), "id".to_string(), request_id.to_string()])
    }

    /// Request ids in display order, newest submission first.
    pub fn request_order() -> StoreKey {
        StoreKey::Simple("requests:order".to_string())
    }

    pub fn idempotency(key: &str) -> StoreKey {
        StoreKey::Composite(vec!["request".to_string(), "idempotency".to_string(), key.to_string()])
    }

    pub fn volunteer_by_id(volunteer_id: &str) -> StoreKey {
        StoreKey::Composite(vec!["volunteer".to_string(), "id".to_string(), volunteer_id.to_string()])
    }

    /// Volunteer ids in registration order.
    pub fn volunteer_order() -> StoreKey {
        StoreKey::Simple("volunteers:order".to_string())
    }
}

#[async_trait]
pub trait RequestRepository: Send + Sync {
    /// Stores a new request at the front of the display order. Fails with a
    /// conflict if the id is already taken.
    async fn insert_request(&self, request: &AidRequest) -> ResqResult<()>;
    async fn get_request(&self, request_id: &str) -> ResqResult<Option<AidRequest>>;
    /// Overwrites an existing request without moving it.
    async fn replace_request(&self, request: &AidRequest) -> ResqResult<()>;
    async fn remove_request(&self, request_id: &str) -> ResqResult<bool>;
    async fn list_requests(&self) -> ResqResult<Vec<AidRequest>>;
    /// Binds `key` to `request_id` unless it is already bound, in which case
    /// the previously bound id is returned.
    async fn claim_idempotency_key(&self, key: &str, request_id: &str) -> ResqResult<Option<String>>;
    async fn release_idempotency_key(&self, key: &str) -> ResqResult<()>;
}

#[async_trait]
pub trait VolunteerRepository: Send + Sync {
    async fn save_volunteer(&self, volunteer: &Volunteer) -> ResqResult<()>;
    async fn get_volunteer(&self, volunteer_id: &str) -> ResqResult<Option<Volunteer>>;
    async fn list_volunteers(&self) -> ResqResult<Vec<Volunteer>>;
}

// Enum to wrap the store backends
pub enum Store {
    Redis(RedisStore),
    Memory(MemoryStore),
}

impl Store {
    pub fn memory() -> Self {
        Store::Memory(MemoryStore::default())
    }

    pub async fn redis(redis_url: &str) -> ResqResult<Self> {
        Ok(Store::Redis(RedisStore::new(redis_url).await?))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Redis(_) => "redis",
            Store::Memory(_) => "memory",
        }
    }
}

// Redis-based store
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl RedisStore {
    pub async fn new(redis_url: &str) -> ResqResult<Self> {
        let client = Client::open(redis_url).map_err(|e| ResqError::RedisConnection(e.to_string()))?;
        let connection = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| ResqError::RedisConnection(e.to_string()))?;

        tracing::info!("Connected to redis store at {}", redis_url);
        Ok(Self { connection })
    }

    fn connection(&self) -> MultiplexedConnection {
        self.connection.clone()
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &StoreKey) -> ResqResult<Option<T>> {
        let mut conn = self.connection();
        let data: Option<String> = redis::cmd("GET").arg(key.render()).query_async(&mut conn).await?;
        data.map(|json| decode(&json)).transpose()
    }

    async fn get_many<T: DeserializeOwned>(&self, keys: Vec<String>) -> ResqResult<Vec<T>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.connection();
        let data: Vec<Option<String>> = redis::cmd("MGET").arg(keys).query_async(&mut conn).await?;
        // Ids left in an order list after a crash mid-delete come back as nil.
        data.into_iter().flatten().map(|json| decode(&json)).collect()
    }

    async fn ordered_ids(&self, key: &StoreKey) -> ResqResult<Vec<String>> {
        let mut conn = self.connection();
        let ids: Vec<String> = redis::cmd("LRANGE").arg(key.render()).arg(0).arg(-1).query_async(&mut conn).await?;
        Ok(ids)
    }
}

#[async_trait]
impl RequestRepository for RedisStore {
    async fn insert_request(&self, request: &AidRequest) -> ResqResult<()> {
        let mut conn = self.connection();
        let json = encode(request)?;

        let stored: Option<String> = redis::cmd("SET")
            .arg(StoreKeys::request_by_id(&request.id).render())
            .arg(json)
            .arg("NX")
            .query_async(&mut conn)
            .await?;
        if stored.is_none() {
            return Err(ResqError::Conflict(format!("request id {} already exists", request.id)));
        }

        let _: () = redis::cmd("LPUSH")
            .arg(StoreKeys::request_order().render())
            .arg(&request.id)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn get_request(&self, request_id: &str) -> ResqResult<Option<AidRequest>> {
        self.get_json(&StoreKeys::request_by_id(request_id)).await
    }

    async fn replace_request(&self, request: &AidRequest) -> ResqResult<()> {
        let mut conn = self.connection();
        let stored: Option<String> = redis::cmd("SET")
            .arg(StoreKeys::request_by_id(&request.id).render())
            .arg(encode(request)?)
            .arg("XX")
            .query_async(&mut conn)
            .await?;
        match stored {
            Some(_) => Ok(()),
            None => Err(ResqError::request_not_found(&request.id)),
        }
    }

    async fn remove_request(&self, request_id: &str) -> ResqResult<bool> {
        let mut conn = self.connection();
        let removed: u32 = redis::cmd("DEL")
            .arg(StoreKeys::request_by_id(request_id).render())
            .query_async(&mut conn)
            .await?;
        let _: () = redis::cmd("LREM")
            .arg(StoreKeys::request_order().render())
            .arg(0)
            .arg(request_id)
            .query_async(&mut conn)
            .await?;
        Ok(removed > 0)
    }

    async fn list_requests(&self) -> ResqResult<Vec<AidRequest>> {
        let ids = self.ordered_ids(&StoreKeys::request_order()).await?;
        let keys = ids.iter().map(|id| StoreKeys::request_by_id(id).render()).collect();
        self.get_many(keys).await
    }

    async fn claim_idempotency_key(&self, key: &str, request_id: &str) -> ResqResult<Option<String>> {
        let mut conn = self.connection();
        let redis_key = StoreKeys::idempotency(key).render();
        let claimed: Option<String> = redis::cmd("SET")
            .arg(&redis_key)
            .arg(request_id)
            .arg("NX")
            .arg("EX")
            .arg(IDEMPOTENCY_TTL_SECONDS)
            .query_async(&mut conn)
            .await?;
        if claimed.is_some() {
            return Ok(None);
        }
        let existing: Option<String> = redis::cmd("GET").arg(&redis_key).query_async(&mut conn).await?;
        Ok(existing)
    }

    async fn release_idempotency_key(&self, key: &str) -> ResqResult<()> {
        let mut conn = self.connection();
        let _: () = redis::cmd("DEL")
            .arg(StoreKeys::idempotency(key).render())
            .query_async(&mut conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl VolunteerRepository for RedisStore {
    async fn save_volunteer(&self, volunteer: &Volunteer) -> ResqResult<()> {
        let mut conn = self.connection();
        let key = StoreKeys::volunteer_by_id(&volunteer.id).render();
        let existed: bool = redis::cmd("EXISTS").arg(&key).query_async(&mut conn).await?;
        let _: () = redis::cmd("SET").arg(&key).arg(encode(volunteer)?).query_async(&mut conn).await?;
        if !existed {
            let _: () = redis::cmd("RPUSH")
                .arg(StoreKeys::volunteer_order().render())
                .arg(&volunteer.id)
                .query_async(&mut conn)
                .await?;
        }
        Ok(())
    }

    async fn get_volunteer(&self, volunteer_id: &str) -> ResqResult<Option<Volunteer>> {
        self.get_json(&StoreKeys::volunteer_by_id(volunteer_id)).await
    }

    async fn list_volunteers(&self) -> ResqResult<Vec<Volunteer>> {
        let ids = self.ordered_ids(&StoreKeys::volunteer_order()).await?;
        let keys = ids.iter().map(|id| StoreKeys::volunteer_by_id(id).render()).collect();
        self.get_many(keys).await
    }
}

// In-process store, the default when no redis url is configured
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    idempotency_ttl: Duration,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_idempotency_ttl(Duration::from_secs(IDEMPOTENCY_TTL_SECONDS))
    }
}

impl MemoryStore {
    pub fn with_idempotency_ttl(idempotency_ttl: Duration) -> Self {
        Self {
            state: RwLock::default(),
            idempotency_ttl,
        }
    }
}

#[derive(Default)]
struct MemoryState {
    requests: HashMap<String, AidRequest>,
    request_order: VecDeque<String>,
    idempotency: HashMap<String, (String, Instant)>, // key -> (request id, claimed at)
    volunteers: HashMap<String, Volunteer>,
    volunteer_order: Vec<String>,
}

#[async_trait]
impl RequestRepository for MemoryStore {
    async fn insert_request(&self, request: &AidRequest) -> ResqResult<()> {
        let mut state = self.state.write().await;
        if state.requests.contains_key(&request.id) {
            return Err(ResqError::Conflict(format!("request id {} already exists", request.id)));
        }
        state.requests.insert(request.id.clone(), request.clone());
        state.request_order.push_front(request.id.clone());
        Ok(())
    }

    async fn get_request(&self, request_id: &str) -> ResqResult<Option<AidRequest>> {
        Ok(self.state.read().await.requests.get(request_id).cloned())
    }

    async fn replace_request(&self, request: &AidRequest) -> ResqResult<()> {
        let mut state = self.state.write().await;
        match state.requests.get_mut(&request.id) {
            Some(slot) => {
                *slot = request.clone();
                Ok(())
            }
            None => Err(ResqError::request_not_found(&request.id)),
        }
    }

    async fn remove_request(&self, request_id: &str) -> ResqResult<bool> {
        let mut state = self.state.write().await;
        let removed = state.requests.remove(request_id).is_some();
        state.request_order.retain(|id| id != request_id);
        Ok(removed)
    }

    async fn list_requests(&self) -> ResqResult<Vec<AidRequest>> {
        let state = self.state.read().await;
        Ok(state
            .request_order
            .iter()
            .filter_map(|id| state.requests.get(id).cloned())
            .collect())
    }

    async fn claim_idempotency_key(&self, key: &str, request_id: &str) -> ResqResult<Option<String>> {
        let mut state = self.state.write().await;
        let ttl = self.idempotency_ttl;
        state.idempotency.retain(|_, (_, claimed_at)| claimed_at.elapsed() < ttl);

        if let Some((existing, _)) = state.idempotency.get(key) {
            return Ok(Some(existing.clone()));
        }
        state
            .idempotency
            .insert(key.to_string(), (request_id.to_string(), Instant::now()));
        Ok(None)
    }

    async fn release_idempotency_key(&self, key: &str) -> ResqResult<()> {
        self.state.write().await.idempotency.remove(key);
        Ok(())
    }
}

#[async_trait]
impl VolunteerRepository for MemoryStore {
    async fn save_volunteer(&self, volunteer: &Volunteer) -> ResqResult<()> {
        let mut state = self.state.write().await;
        if state.volunteers.insert(volunteer.id.clone(), volunteer.clone()).is_none() {
            state.volunteer_order.push(volunteer.id.clone());
        }
        Ok(())
    }

    async fn get_volunteer(&self, volunteer_id: &str) -> ResqResult<Option<Volunteer>> {
        Ok(self.state.read().await.volunteers.get(volunteer_id).cloned())
    }

    async fn list_volunteers(&self) -> ResqResult<Vec<Volunteer>> {
        let state = self.state.read().await;
        Ok(state
            .volunteer_order
            .iter()
            .filter_map(|id| state.volunteers.get(id).cloned())
            .collect())
    }
}

// ------------------------------
// Enum delegations (Store)
// ------------------------------

#[async_trait]
impl RequestRepository for Store {
    async fn insert_request(&self, request: &AidRequest) -> ResqResult<()> {
        match self {
            Store::Redis(store) => store.insert_request(request).await,
            Store::Memory(store) => store.insert_request(request).await,
        }
    }

    async fn get_request(&self, request_id: &str) -> ResqResult<Option<AidRequest>> {
        match self {
            Store::Redis(store) => store.get_request(request_id).await,
            Store::Memory(store) => store.get_request(request_id).await,
        }
    }

    async fn replace_request(&self, request: &AidRequest) -> ResqResult<()> {
        match self {
            Store::Redis(store) => store.replace_request(request).await,
            Store::Memory(store) => store.replace_request(request).await,
        }
    }

    async fn remove_request(&self, request_id: &str) -> ResqResult<bool> {
        match self {
            Store::Redis(store) => store.remove_request(request_id).await,
            Store::Memory(store) => store.remove_request(request_id).await,
        }
    }

    async fn list_requests(&self) -> ResqResult<Vec<AidRequest>> {
        match self {
            Store::Redis(store) => store.list_requests().await,
            Store::Memory(store) => store.list_requests().await,
        }
    }

    async fn claim_idempotency_key(&self, key: &str, request_id: &str) -> ResqResult<Option<String>> {
        match self {
            Store::Redis(store) => store.claim_idempotency_key(key, request_id).await,
            Store::Memory(store) => store.claim_idempotency_key(key, request_id).await,
        }
    }

    async fn release_idempotency_key(&self, key: &str) -> ResqResult<()> {
        match self {
            Store::Redis(store) => store.release_idempotency_key(key).await,
            Store::Memory(store) => store.release_idempotency_key(key).await,
        }
    }
}

#[async_trait]
impl VolunteerRepository for Store {
    async fn save_volunteer(&self, volunteer: &Volunteer) -> ResqResult<()> {
        match self {
            Store::Redis(store) => store.save_volunteer(volunteer).await,
            Store::Memory(store) => store.save_volunteer(volunteer).await,
        }
    }

    async fn get_volunteer(&self, volunteer_id: &str) -> ResqResult<Option<Volunteer>> {
        match self {
            Store::Redis(store) => store.get_volunteer(volunteer_id).await,
            Store::Memory(store) => store.get_volunteer(volunteer_id).await,
        }
    }

    async fn list_volunteers(&self) -> ResqResult<Vec<Volunteer>> {
        match self {
            Store::Redis(store) => store.list_volunteers().await,
            Store::Memory(store) => store.list_volunteers().await,
        }
    }
}

fn encode<T: Serialize>(value: &T) -> ResqResult<String> {
    serde_json::to_string(value).map_err(|e| ResqError::StoreSerialization(e.to_string()))
}

fn decode<T: DeserializeOwned>(json: &str) -> ResqResult<T> {
    serde_json::from_str(json).map_err(|e| ResqError::StoreSerialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::request::{AidType, Location, NewAidRequest};
    use chrono::Utc;

    fn request(id: &str) -> AidRequest {
        let mut request = AidRequest::from_new(
            NewAidRequest::default(),
            AidType::Medical,
            Location::Address("Springfield".into()),
            Utc::now(),
        );
        request.id = id.to_string();
        request
    }

    #[test]
    fn test_key_rendering() {
        assert_eq!(StoreKeys::request_by_id("req-1").render(), "request:id:req-1");
        assert_eq!(StoreKeys::request_order().render(), "requests:order");
        assert_eq!(StoreKeys::idempotency("abc").render(), "request:idempotency:abc");
    }

    #[tokio::test]
    async fn test_memory_insert_prepends() {
        let store = Store::memory();
        store.insert_request(&request("a")).await.unwrap();
        store.insert_request(&request("b")).await.unwrap();

        let ids: Vec<_> = store.list_requests().await.unwrap().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_memory_insert_rejects_duplicate_id() {
        let store = Store::memory();
        store.insert_request(&request("a")).await.unwrap();
        let err = store.insert_request(&request("a")).await.unwrap_err();
        assert!(matches!(err, ResqError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_memory_replace_keeps_position() {
        let store = Store::memory();
        for id in ["a", "b", "c"] {
            store.insert_request(&request(id)).await.unwrap();
        }
        let mut updated = request("b");
        updated.details = "changed".into();
        store.replace_request(&updated).await.unwrap();

        let listed = store.list_requests().await.unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[1].id, "b");
        assert_eq!(listed[1].details, "changed");

        let missing = store.replace_request(&request("zzz")).await.unwrap_err();
        assert!(matches!(missing, ResqError::RequestNotFound(_)));
    }

    #[tokio::test]
    async fn test_memory_remove() {
        let store = Store::memory();
        store.insert_request(&request("a")).await.unwrap();
        assert!(store.remove_request("a").await.unwrap());
        assert!(!store.remove_request("a").await.unwrap());
        assert!(store.list_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_idempotency_claim() {
        let store = Store::memory();
        assert_eq!(store.claim_idempotency_key("k1", "req-a").await.unwrap(), None);
        assert_eq!(store.claim_idempotency_key("k1", "req-b").await.unwrap(), Some("req-a".to_string()));
        store.release_idempotency_key("k1").await.unwrap();
        assert_eq!(store.claim_idempotency_key("k1", "req-c").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_memory_idempotency_keys_expire() {
        let store = Store::Memory(MemoryStore::with_idempotency_ttl(Duration::from_millis(50)));
        assert_eq!(store.claim_idempotency_key("k1", "req-a").await.unwrap(), None);
        assert_eq!(store.claim_idempotency_key("k1", "req-b").await.unwrap(), Some("req-a".to_string()));

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.claim_idempotency_key("k2", "req-c").await.unwrap(), None);
        if let Store::Memory(memory) = &store {
            assert_eq!(memory.state.read().await.idempotency.len(), 1);
        }
        assert_eq!(store.claim_idempotency_key("k1", "req-d").await.unwrap(), None);
    }
}
