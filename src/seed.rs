//! Demo data matching what the relief dashboards show before any real
//! submissions arrive.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{
    errors::ResqResult,
    models::{
        notification::{Notification, NotificationCategory},
        request::{AidRequest, AidType, Location, RequestStatus, Urgency},
        volunteer::{Volunteer, VolunteerStatus},
    },
    services::{
        notification_service::NotificationService,
        store_service::{RequestRepository, Store, VolunteerRepository},
    },
};

struct RequestSeed {
    id: &'static str,
    aid_type: AidType,
    details: &'static str,
    location: Location,
    urgency: Urgency,
    status: RequestStatus,
    created_at: DateTime<Utc>,
    requester: Option<&'static str>,
    contact: &'static str,
    responses: u32,
    helper: Option<&'static str>,
    required_items: &'static [&'static str],
}

impl RequestSeed {
    fn build(self) -> AidRequest {
        AidRequest {
            id: self.id.to_string(),
            reference_code: format!("RQ{}", self.id[11..].to_uppercase()),
            aid_type: self.aid_type,
            details: self.details.to_string(),
            location: self.location,
            urgency: self.urgency,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.created_at,
            contact: Some(self.contact.to_string()),
            requester: self.requester.map(str::to_string),
            required_items: self.required_items.iter().map(|s| s.to_string()).collect(),
            responses: self.responses,
            helper: self.helper.map(str::to_string),
            volunteers: Vec::new(),
            assignees: Vec::new(),
        }
    }
}

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).single().unwrap_or_else(Utc::now)
}

fn pinned(address: &str, latitude: f64, longitude: f64) -> Location {
    Location::Pinned {
        address: address.to_string(),
        longitude,
        latitude,
    }
}

/// The open requests a volunteer sees, newest first. Two are high urgency.
pub fn volunteer_board_requests() -> Vec<AidRequest> {
    let pending = RequestStatus::Pending;
    vec![
        RequestSeed {
            id: "req-250612-vb001",
            aid_type: AidType::Medical,
            details: "Urgent need for insulin and medical supplies for diabetic patients",
            location: pinned("New York, NY", 40.7128, -74.006),
            urgency: Urgency::High,
            status: pending,
            created_at: at(2025, 6, 12, 10, 30),
            requester: Some("Dr. Sarah Johnson"),
            contact: "+1-555-0123",
            responses: 0,
            helper: None,
            required_items: &[],
        },
        RequestSeed {
            id: "req-250612-vb002",
            aid_type: AidType::Food,
            details: "Emergency food supplies needed for 50 families affected by flooding",
            location: pinned("Los Angeles, CA", 34.0522, -118.2437),
            urgency: Urgency::Medium,
            status: pending,
            created_at: at(2025, 6, 12, 8, 15),
            requester: Some("Community Center"),
            contact: "+1-555-0456",
            responses: 0,
            helper: None,
            required_items: &[],
        },
        RequestSeed {
            id: "req-250612-vb003",
            aid_type: AidType::Shelter,
            details: "Temporary housing needed for displaced families after fire",
            location: pinned("Chicago, IL", 41.8781, -87.6298),
            urgency: Urgency::High,
            status: pending,
            created_at: at(2025, 6, 12, 6, 45),
            requester: Some("Red Cross Volunteer"),
            contact: "+1-555-0789",
            responses: 0,
            helper: None,
            required_items: &[],
        },
        RequestSeed {
            id: "req-250611-vb004",
            aid_type: AidType::Transportation,
            details: "Vehicle needed to transport elderly residents to safety",
            location: pinned("Houston, TX", 29.7604, -95.3698),
            urgency: Urgency::Medium,
            status: pending,
            created_at: at(2025, 6, 11, 20, 30),
            requester: Some("Local Fire Department"),
            contact: "+1-555-0321",
            responses: 0,
            helper: None,
            required_items: &[],
        },
        RequestSeed {
            id: "req-250611-vb005",
            aid_type: AidType::Supplies,
            details: "Blankets, water, and basic supplies for storm victims",
            location: pinned("Miami, FL", 25.7617, -80.1918),
            urgency: Urgency::Low,
            status: pending,
            created_at: at(2025, 6, 11, 15, 20),
            requester: Some("Community Volunteer"),
            contact: "+1-555-0654",
            responses: 0,
            helper: None,
            required_items: &[],
        },
    ]
    .into_iter()
    .map(RequestSeed::build)
    .collect()
}

/// One requester's history across every status.
pub fn victim_requests() -> Vec<AidRequest> {
    vec![
        RequestSeed {
            id: "req-250612-vc001",
            aid_type: AidType::Medical,
            details: "Need insulin and medical supplies for diabetic family member",
            location: Location::Address("123 Main St, Springfield, IL".into()),
            urgency: Urgency::High,
            status: RequestStatus::Pending,
            created_at: at(2025, 6, 12, 10, 30),
            requester: None,
            contact: "+1-555-0123",
            responses: 2,
            helper: None,
            required_items: &[],
        },
        RequestSeed {
            id: "req-250611-vc002",
            aid_type: AidType::Food,
            details: "Family of 4 needs emergency food supplies after house fire",
            location: Location::Address("456 Oak Ave, Springfield, IL".into()),
            urgency: Urgency::Medium,
            status: RequestStatus::Accepted,
            created_at: at(2025, 6, 11, 14, 20),
            requester: None,
            contact: "+1-555-0123",
            responses: 1,
            helper: Some("Community Food Bank"),
            required_items: &[],
        },
        RequestSeed {
            id: "req-250610-vc003",
            aid_type: AidType::Shelter,
            details: "Temporary housing needed for elderly couple after flood damage",
            location: Location::Address("789 Pine St, Springfield, IL".into()),
            urgency: Urgency::High,
            status: RequestStatus::Completed,
            created_at: at(2025, 6, 10, 9, 15),
            requester: None,
            contact: "+1-555-0123",
            responses: 3,
            helper: Some("Red Cross Shelter"),
            required_items: &[],
        },
    ]
    .into_iter()
    .map(RequestSeed::build)
    .collect()
}

/// Operations an organization is coordinating.
pub fn organization_requests() -> Vec<AidRequest> {
    vec![
        RequestSeed {
            id: "req-250612-or001",
            aid_type: AidType::Medical,
            details: "Urgent medical supplies needed for flood victims",
            location: Location::Address("Mumbai, Bandra West".into()),
            urgency: Urgency::High,
            status: RequestStatus::Accepted,
            created_at: at(2025, 6, 12, 8, 0),
            requester: Some("Red Cross International"),
            contact: "ops@redcross.example",
            responses: 3,
            helper: None,
            required_items: &["Medicines", "First Aid Kits", "Oxygen Cylinders"],
        },
        RequestSeed {
            id: "req-250612-or002",
            aid_type: AidType::Food,
            details: "Food supplies for earthquake relief",
            location: Location::Address("Delhi, Rohini".into()),
            urgency: Urgency::Medium,
            status: RequestStatus::Accepted,
            created_at: at(2025, 6, 12, 6, 0),
            requester: Some("Red Cross International"),
            contact: "ops@redcross.example",
            responses: 5,
            helper: None,
            required_items: &["Rice", "Dal", "Water Bottles"],
        },
        RequestSeed {
            id: "req-250611-or003",
            aid_type: AidType::Shelter,
            details: "Temporary shelter setup for cyclone victims",
            location: Location::Address("Chennai, Anna Nagar".into()),
            urgency: Urgency::High,
            status: RequestStatus::Completed,
            created_at: at(2025, 6, 11, 10, 0),
            requester: Some("Red Cross International"),
            contact: "ops@redcross.example",
            responses: 8,
            helper: None,
            required_items: &["Tents", "Blankets", "Tarpaulins"],
        },
    ]
    .into_iter()
    .map(RequestSeed::build)
    .collect()
}

pub fn organization_volunteers() -> Vec<Volunteer> {
    let joined = at(2025, 6, 1, 9, 0);
    [
        ("vol-250601-or001", "Rajesh Kumar", "Medical Aid", VolunteerStatus::Available, 5, "Mumbai"),
        ("vol-250601-or002", "Priya Sharma", "Food Distribution", VolunteerStatus::Busy, 3, "Delhi"),
        ("vol-250601-or003", "Amit Singh", "Logistics", VolunteerStatus::Available, 7, "Bangalore"),
        ("vol-250601-or004", "Sneha Patel", "Rescue Operations", VolunteerStatus::Busy, 4, "Ahmedabad"),
    ]
    .into_iter()
    .map(|(id, name, role, status, experience_years, location)| Volunteer {
        id: id.to_string(),
        name: name.to_string(),
        role: role.to_string(),
        status,
        experience_years,
        location: location.to_string(),
        created_at: joined,
    })
    .collect()
}

/// Oldest first, so appending keeps the feed's newest-first view intact.
pub fn organization_notifications(now: DateTime<Utc>) -> Vec<Notification> {
    [
        ("not-250612-or003", NotificationCategory::Success, "Chennai relief operation completed", 180),
        ("not-250612-or002", NotificationCategory::Info, "5 volunteers registered today", 60),
        ("not-250612-or001", NotificationCategory::Urgent, "New high-priority request in Mumbai", 10),
    ]
    .into_iter()
    .map(|(id, category, message, minutes_ago)| Notification {
        id: id.to_string(),
        category,
        message: message.to_string(),
        request_id: None,
        created_at: now - Duration::minutes(minutes_ago),
    })
    .collect()
}

/// Loads every demo set. Requests are inserted back to front because the
/// store prepends, so listings come out in the order above.
pub async fn seed_demo_data(store: &Store, notifications: &NotificationService) -> ResqResult<()> {
    let requests: Vec<AidRequest> = volunteer_board_requests()
        .into_iter()
        .chain(organization_requests())
        .chain(victim_requests())
        .collect();

    for request in requests.iter().rev() {
        store.insert_request(request).await?;
    }
    for volunteer in organization_volunteers() {
        store.save_volunteer(&volunteer).await?;
    }
    for notification in organization_notifications(Utc::now()) {
        notifications.record(notification).await;
    }

    tracing::info!("Seeded {} demo requests", requests.len());
    Ok(())
}
