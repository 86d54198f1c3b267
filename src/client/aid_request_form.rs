// src/client/aid_request_form.rs
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing;
use uuid::Uuid;

#[cfg(test)]
use mockall::automock;

use crate::{
    errors::{ResqError, ResqResult},
    handlers::request_handler::IDEMPOTENCY_HEADER,
    models::request::{AidRequest, AidType},
};

/// A point picked on the map. The map hands back `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPin {
    pub longitude: f64,
    pub latitude: f64,
}

impl From<[f64; 2]> for MapPin {
    fn from(lng_lat: [f64; 2]) -> Self {
        Self {
            longitude: lng_lat[0],
            latitude: lng_lat[1],
        }
    }
}

/// Body of `POST /api/aid-requests` as the form sends it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AidRequestPayload {
    #[serde(rename = "type")]
    pub aid_type: String,
    pub location: MapPin,
    pub details: String,
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait AidRequestTransport: Send + Sync {
    async fn send(&self, payload: &AidRequestPayload, idempotency_key: &str) -> ResqResult<AidRequest>;
}

/// Talks to a running service over HTTP.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> ResqResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AidRequestTransport for HttpTransport {
    async fn send(&self, payload: &AidRequestPayload, idempotency_key: &str) -> ResqResult<AidRequest> {
        let url = format!("{}/api/aid-requests", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(IDEMPOTENCY_HEADER, idempotency_key)
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ResqError::bad_request(format!("{}: {}", status, body)));
        }

        Ok(response.json::<AidRequest>().await?)
    }
}

/// State of the "request aid" form between keystrokes.
#[derive(Debug, Clone)]
pub struct AidRequestForm {
    aid_type: Option<String>,
    pin: Option<MapPin>,
    details: String,
    idempotency_key: String,
}

impl Default for AidRequestForm {
    fn default() -> Self {
        Self {
            aid_type: None,
            pin: None,
            details: String::new(),
            idempotency_key: Uuid::new_v4().to_string(),
        }
    }
}

impl AidRequestForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_type(&mut self, aid_type: impl Into<String>) {
        self.aid_type = Some(aid_type.into());
    }

    pub fn drop_pin(&mut self, lng_lat: [f64; 2]) {
        self.pin = Some(MapPin::from(lng_lat));
    }

    pub fn set_details(&mut self, details: impl Into<String>) {
        self.details = details.into();
    }

    pub fn aid_type(&self) -> Option<&str> {
        self.aid_type.as_deref()
    }

    pub fn pin(&self) -> Option<MapPin> {
        self.pin
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn idempotency_key(&self) -> &str {
        &self.idempotency_key
    }

    /// Builds the outbound body, or says which field is still missing.
    pub fn payload(&self) -> ResqResult<AidRequestPayload> {
        let aid_type = self
            .aid_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ResqError::MissingRequiredField("type".to_string()))?;
        aid_type.parse::<AidType>()?;

        let location = self
            .pin
            .ok_or_else(|| ResqError::MissingRequiredField("location".to_string()))?;

        Ok(AidRequestPayload {
            aid_type: aid_type.to_string(),
            location,
            details: self.details.clone(),
        })
    }

    /// Resets every field and starts a new idempotency key.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Sends the form once. On success the form is cleared; on a transport
    /// failure it keeps its values so the user can try again.
    pub async fn submit(&mut self, transport: &dyn AidRequestTransport) -> ResqResult<AidRequest> {
        let payload = self.payload()?;

        match transport.send(&payload, &self.idempotency_key).await {
            Ok(created) => {
                tracing::info!("Aid request submitted: {}", created.reference_code);
                self.clear();
                Ok(created)
            }
            Err(e) => {
                tracing::warn!("Aid request submission failed: {}", e);
                Err(ResqError::SubmissionFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed;

    fn filled_form() -> AidRequestForm {
        let mut form = AidRequestForm::new();
        form.select_type("food");
        form.drop_pin([-87.6298, 41.8781]);
        form.set_details("Two adults, one infant");
        form
    }

    #[tokio::test]
    async fn test_no_call_without_type() {
        let mut transport = MockAidRequestTransport::new();
        transport.expect_send().times(0);

        let mut form = AidRequestForm::new();
        form.drop_pin([10.0, 20.0]);
        assert!(matches!(
            form.submit(&transport).await,
            Err(ResqError::MissingRequiredField(field)) if field == "type"
        ));
        assert_eq!(form.pin(), Some(MapPin { longitude: 10.0, latitude: 20.0 }));
    }

    #[tokio::test]
    async fn test_no_call_without_pin() {
        let mut transport = MockAidRequestTransport::new();
        transport.expect_send().times(0);

        let mut form = AidRequestForm::new();
        form.select_type("medical");
        assert!(matches!(
            form.submit(&transport).await,
            Err(ResqError::MissingRequiredField(field)) if field == "location"
        ));
        assert_eq!(form.aid_type(), Some("medical"));
    }

    #[tokio::test]
    async fn test_single_call_then_cleared() {
        let mut form = filled_form();
        let key = form.idempotency_key().to_string();

        let mut transport = MockAidRequestTransport::new();
        transport
            .expect_send()
            .withf(move |payload, sent_key| {
                payload.aid_type == "food"
                    && payload.details == "Two adults, one infant"
                    && payload.location.longitude == -87.6298
                    && payload.location.latitude == 41.8781
                    && sent_key.to_string() == key
            })
            .times(1)
            .returning(|_, _| Ok(seed::volunteer_board_requests().remove(1)));

        let created = form.submit(&transport).await.unwrap();
        assert_eq!(created.id, "req-250612-vb002");
        assert!(form.aid_type().is_none());
        assert!(form.pin().is_none());
        assert!(form.details().is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_values_and_key() {
        let mut form = filled_form();
        let key = form.idempotency_key().to_string();

        let mut transport = MockAidRequestTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_, _| Err(ResqError::NetworkTimeout));

        assert!(matches!(form.submit(&transport).await, Err(ResqError::SubmissionFailed)));
        assert_eq!(form.aid_type(), Some("food"));
        assert_eq!(form.details(), "Two adults, one infant");
        assert_eq!(form.idempotency_key(), key);
    }

    #[test]
    fn test_payload_shape() {
        let payload = filled_form().payload().unwrap();
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], "food");
        assert_eq!(value["location"]["longitude"], -87.6298);
        assert_eq!(value["location"]["latitude"], 41.8781);
    }
}
