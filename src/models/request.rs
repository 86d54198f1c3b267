// src/models/request.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{ResqError, ValidationError};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(try_from = "String")]
pub enum AidType {
    Medical,
    Food,
    Shelter,
    Transportation,
    Supplies,
}

impl AidType {
    pub const ALL: [AidType; 5] = [
        AidType::Medical,
        AidType::Food,
        AidType::Shelter,
        AidType::Transportation,
        AidType::Supplies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AidType::Medical => "Medical",
            AidType::Food => "Food",
            AidType::Shelter => "Shelter",
            AidType::Transportation => "Transportation",
            AidType::Supplies => "Supplies",
        }
    }
}

impl fmt::Display for AidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AidType {
    type Err = ResqError;

    /// Case-insensitive; the pin form submits lowercase values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ResqError::MissingRequiredField("type".to_string()));
        }
        AidType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ResqError::invalid_field("type", trimmed, "unknown aid type"))
    }
}

impl TryFrom<String> for AidType {
    type Error = ResqError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Urgency {
    type Err = ResqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Urgency::Low),
            "medium" => Ok(Urgency::Medium),
            "high" => Ok(Urgency::High),
            other => Err(ResqError::invalid_field("urgency", other, "expected low, medium or high")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[default]
    Pending, // Waiting for a volunteer or organization
    #[serde(alias = "active", alias = "in-progress")]
    Accepted, // Someone is on it
    Completed, // Terminal
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Completed => "completed",
        }
    }

    /// Only pending -> accepted -> completed.
    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Accepted) | (RequestStatus::Accepted, RequestStatus::Completed)
        )
    }

    pub fn transition_to(&self, next: RequestStatus) -> Result<RequestStatus, ResqError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ResqError::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = ResqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(RequestStatus::Pending),
            "accepted" | "active" | "in-progress" => Ok(RequestStatus::Accepted),
            "completed" => Ok(RequestStatus::Completed),
            other => Err(ResqError::invalid_field("status", other, "expected pending, accepted or completed")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint {
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            errors.push(ValidationError {
                field: "location.longitude".to_string(),
                message: "longitude must be between -180 and 180".to_string(),
            });
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            errors.push(ValidationError {
                field: "location.latitude".to_string(),
                message: "latitude must be between -90 and 90".to_string(),
            });
        }
        errors
    }
}

/// Where help is needed: a typed address, a map pin, or both.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Location {
    Pinned {
        address: String,
        longitude: f64,
        latitude: f64,
    },
    Point(GeoPoint),
    Address(String),
}

impl Location {
    pub fn address(&self) -> Option<&str> {
        match self {
            Location::Pinned { address, .. } | Location::Address(address) => Some(address),
            Location::Point(_) => None,
        }
    }

    pub fn point(&self) -> Option<GeoPoint> {
        match self {
            Location::Pinned { longitude, latitude, .. } => Some(GeoPoint {
                longitude: *longitude,
                latitude: *latitude,
            }),
            Location::Point(point) => Some(*point),
            Location::Address(_) => None,
        }
    }

    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = self.point().map(|p| p.validate()).unwrap_or_default();
        if let Some(address) = self.address() {
            if address.trim().is_empty() {
                errors.push(ValidationError {
                    field: "location".to_string(),
                    message: "address must not be empty".to_string(),
                });
            }
        }
        errors
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AidRequest {
    pub id: String,
    pub reference_code: String,
    #[serde(rename = "type")]
    pub aid_type: AidType,
    pub details: String,
    pub location: Location,
    pub urgency: Urgency,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub contact: Option<String>,
    pub requester: Option<String>,
    #[serde(default)]
    pub required_items: Vec<String>,
    pub responses: u32,
    pub helper: Option<String>, // Name of the assigned helper, shown to the requester
    #[serde(default)]
    pub volunteers: Vec<String>, // Volunteer ids engaged on this request
    #[serde(default)]
    pub assignees: Vec<String>, // Subset of `volunteers` placed by an organization and marked busy
}

impl AidRequest {
    /// Build a pending request from an intake payload. The id is left empty
    /// for the caller to fill via `WithGeneratedId`.
    pub fn from_new(request: NewAidRequest, aid_type: AidType, location: Location, now: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            reference_code: crate::utils::id_generator::IdGenerator::generate_reference_code(),
            aid_type,
            details: request.details.trim().to_string(),
            location,
            urgency: request.urgency.unwrap_or_default(),
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
            contact: non_blank(request.contact),
            requester: non_blank(request.requester),
            required_items: request.required_items,
            responses: 0,
            helper: None,
            volunteers: Vec::new(),
            assignees: Vec::new(),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// Records an organization assignment; the volunteer is engaged too.
    pub fn assign_volunteer(&mut self, volunteer_id: &str) {
        self.engage_volunteer(volunteer_id);
        if !self.assignees.iter().any(|v| v == volunteer_id) {
            self.assignees.push(volunteer_id.to_string());
        }
    }

    /// Adds a volunteer once; returns false if they were already engaged.
    pub fn engage_volunteer(&mut self, volunteer_id: &str) -> bool {
        if self.volunteers.iter().any(|v| v == volunteer_id) {
            return false;
        }
        self.volunteers.push(volunteer_id.to_string());
        self.responses += 1;
        true
    }
}

/// A request as listed on the dashboards, with its age rendered.
#[derive(Debug, Serialize, Clone)]
pub struct AidRequestView {
    #[serde(flatten)]
    pub request: AidRequest,
    pub time_ago: String,
}

impl AidRequest {
    pub fn view(self, now: DateTime<Utc>) -> AidRequestView {
        let time_ago = format_time_ago(self.created_at, now);
        AidRequestView { request: self, time_ago }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

// Request/Response Models

/// Intake payload. `type` stays a raw string so a missing or blank value is
/// reported as a validation error instead of a JSON parse failure.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct NewAidRequest {
    #[serde(rename = "type", default)]
    pub aid_type: Option<String>,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default, alias = "severity")]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub contact: Option<String>,
    #[serde(default)]
    pub requester: Option<String>,
    #[serde(default, alias = "requiredItems")]
    pub required_items: Vec<String>,
}

impl NewAidRequest {
    /// Checks the fields every intake needs: a known type and a usable location.
    pub fn validate(&self) -> Result<(AidType, Location), ResqError> {
        let aid_type: AidType = match self.aid_type.as_deref() {
            None => return Err(ResqError::MissingRequiredField("type".to_string())),
            Some(raw) => raw.parse()?,
        };

        let location = self
            .location
            .clone()
            .ok_or_else(|| ResqError::MissingRequiredField("location".to_string()))?;
        let errors = location.validate();
        if !errors.is_empty() {
            return Err(ResqError::ValidationFailed(errors));
        }

        Ok((aid_type, location))
    }

    /// Edits come from the requester's own form, which also insists on
    /// details and a way to reach them.
    pub fn validate_for_edit(&self) -> Result<(AidType, Location), ResqError> {
        let mut errors = Vec::new();
        if self.details.trim().is_empty() {
            errors.push(ValidationError {
                field: "details".to_string(),
                message: "details are required".to_string(),
            });
        }
        if self.contact.as_deref().is_none_or(|c| c.trim().is_empty()) {
            errors.push(ValidationError {
                field: "contact".to_string(),
                message: "contact is required".to_string(),
            });
        }
        if self.location.is_none() {
            errors.push(ValidationError {
                field: "location".to_string(),
                message: "location is required".to_string(),
            });
        }
        if !errors.is_empty() {
            return Err(ResqError::ValidationFailed(errors));
        }
        self.validate()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct StatusStats {
    pub total: usize,
    pub pending: usize,
    pub accepted: usize,
    pub completed: usize,
}

impl StatusStats {
    pub fn from_requests<'a>(requests: impl IntoIterator<Item = &'a AidRequest>) -> Self {
        requests.into_iter().fold(StatusStats::default(), |mut stats, request| {
            stats.total += 1;
            match request.status {
                RequestStatus::Pending => stats.pending += 1,
                RequestStatus::Accepted => stats.accepted += 1,
                RequestStatus::Completed => stats.completed += 1,
            }
            stats
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct UrgencyBreakdown {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl UrgencyBreakdown {
    pub fn from_requests<'a>(requests: impl IntoIterator<Item = &'a AidRequest>) -> Self {
        requests.into_iter().fold(UrgencyBreakdown::default(), |mut counts, request| {
            match request.urgency {
                Urgency::Low => counts.low += 1,
                Urgency::Medium => counts.medium += 1,
                Urgency::High => counts.high += 1,
            }
            counts
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VolunteerAction {
    #[serde(alias = "volunteerId")]
    pub volunteer_id: String,
}

/// "Just now", "5h ago", "3d ago".
pub fn format_time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = now.signed_duration_since(then).num_hours();
    if hours < 1 {
        "Just now".to_string()
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else {
        format!("{}d ago", hours / 24)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    #[test]
    fn test_aid_type_is_case_insensitive() {
        assert_eq!("food".parse::<AidType>().unwrap(), AidType::Food);
        assert_eq!("MEDICAL".parse::<AidType>().unwrap(), AidType::Medical);
        assert!(matches!("".parse::<AidType>(), Err(ResqError::MissingRequiredField(_))));
        assert!(matches!("boats".parse::<AidType>(), Err(ResqError::InvalidFieldValue { .. })));
    }

    #[test]
    fn test_status_transitions() {
        assert!(RequestStatus::Pending.can_transition_to(RequestStatus::Accepted));
        assert!(RequestStatus::Accepted.can_transition_to(RequestStatus::Completed));
        assert!(!RequestStatus::Pending.can_transition_to(RequestStatus::Completed));
        assert!(!RequestStatus::Completed.can_transition_to(RequestStatus::Pending));
        assert!(!RequestStatus::Accepted.can_transition_to(RequestStatus::Accepted));

        let err = RequestStatus::Completed.transition_to(RequestStatus::Accepted).unwrap_err();
        assert!(matches!(err, ResqError::InvalidTransition { .. }));
    }

    #[test]
    fn test_status_aliases() {
        let status: RequestStatus = serde_json::from_value(json!("in-progress")).unwrap();
        assert_eq!(status, RequestStatus::Accepted);
        let status: RequestStatus = serde_json::from_value(json!("active")).unwrap();
        assert_eq!(status, RequestStatus::Accepted);
        assert_eq!("Completed".parse::<RequestStatus>().unwrap(), RequestStatus::Completed);
    }

    #[test]
    fn test_location_shapes() {
        let pin: Location = serde_json::from_value(json!({ "longitude": -74.006, "latitude": 40.7128 })).unwrap();
        assert_eq!(
            pin.point(),
            Some(GeoPoint {
                longitude: -74.006,
                latitude: 40.7128
            })
        );
        assert_eq!(pin.address(), None);

        let address: Location = serde_json::from_value(json!("123 Main St, Springfield, IL")).unwrap();
        assert_eq!(address.address(), Some("123 Main St, Springfield, IL"));

        let both: Location = serde_json::from_value(json!({
            "address": "New York, NY",
            "longitude": -74.006,
            "latitude": 40.7128
        }))
        .unwrap();
        assert_eq!(both.address(), Some("New York, NY"));
        assert!(both.point().is_some());
    }

    #[test]
    fn test_location_validation() {
        let bad = Location::Point(GeoPoint {
            longitude: 200.0,
            latitude: f64::NAN,
        });
        assert_eq!(bad.validate().len(), 2);
        assert_eq!(Location::Address("  ".into()).validate().len(), 1);
    }

    #[test]
    fn test_new_request_validation() {
        let missing_type = NewAidRequest {
            location: Some(Location::Address("Springfield".into())),
            ..Default::default()
        };
        assert!(matches!(missing_type.validate(), Err(ResqError::MissingRequiredField(f)) if f == "type"));

        let missing_location = NewAidRequest {
            aid_type: Some("shelter".into()),
            ..Default::default()
        };
        assert!(matches!(missing_location.validate(), Err(ResqError::MissingRequiredField(f)) if f == "location"));

        let ok = NewAidRequest {
            aid_type: Some("shelter".into()),
            location: Some(Location::Address("Springfield".into())),
            ..Default::default()
        };
        let (aid_type, _) = ok.validate().unwrap();
        assert_eq!(aid_type, AidType::Shelter);

        match ok.validate_for_edit() {
            Err(ResqError::ValidationFailed(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["details", "contact"]);
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_engage_volunteer_counts_once() {
        let now = Utc::now();
        let mut request = AidRequest::from_new(
            NewAidRequest {
                aid_type: Some("food".into()),
                ..Default::default()
            },
            AidType::Food,
            Location::Address("Delhi, Rohini".into()),
            now,
        );
        assert!(request.engage_volunteer("vol-250612-abc12"));
        assert!(!request.engage_volunteer("vol-250612-abc12"));
        assert_eq!(request.responses, 1);
        assert_eq!(request.volunteers.len(), 1);
    }

    #[test]
    fn test_format_time_ago() {
        let now = Utc.with_ymd_and_hms(2025, 6, 12, 12, 0, 0).unwrap();
        assert_eq!(format_time_ago(now - Duration::minutes(30), now), "Just now");
        assert_eq!(format_time_ago(now - Duration::hours(5), now), "5h ago");
        assert_eq!(format_time_ago(now - Duration::hours(49), now), "2d ago");
    }
}
