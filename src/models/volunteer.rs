// src/models/volunteer.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{ResqError, ValidationError};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum VolunteerStatus {
    #[default]
    Available, // Free to be assigned
    Busy,      // Already on a request
}

impl fmt::Display for VolunteerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolunteerStatus::Available => f.write_str("available"),
            VolunteerStatus::Busy => f.write_str("busy"),
        }
    }
}

impl FromStr for VolunteerStatus {
    type Err = ResqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(VolunteerStatus::Available),
            "busy" => Ok(VolunteerStatus::Busy),
            other => Err(ResqError::invalid_field("status", other, "expected available or busy")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Volunteer {
    pub id: String,
    pub name: String,
    pub role: String, // Skill category, e.g. "Medical Aid", "Logistics"
    pub status: VolunteerStatus,
    pub experience_years: u32,
    pub location: String,
    pub created_at: DateTime<Utc>,
}

impl Volunteer {
    pub fn is_available(&self) -> bool {
        self.status == VolunteerStatus::Available
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct VolunteerRegistration {
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub experience_years: u32,
    #[serde(default)]
    pub location: String,
}

impl VolunteerRegistration {
    pub fn validate(&self) -> Result<(), ResqError> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push(ValidationError {
                field: "name".to_string(),
                message: "name is required".to_string(),
            });
        }
        if self.role.trim().is_empty() {
            errors.push(ValidationError {
                field: "role".to_string(),
                message: "role is required".to_string(),
            });
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ResqError::ValidationFailed(errors))
        }
    }

    pub fn into_volunteer(self, now: DateTime<Utc>) -> Volunteer {
        Volunteer {
            id: String::new(),
            name: self.name.trim().to_string(),
            role: self.role.trim().to_string(),
            status: VolunteerStatus::Available,
            experience_years: self.experience_years,
            location: self.location.trim().to_string(),
            created_at: now,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VolunteerStatusUpdate {
    pub status: VolunteerStatus,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct AvailabilityStats {
    pub available: usize,
    pub busy: usize,
}

impl AvailabilityStats {
    pub fn from_volunteers<'a>(volunteers: impl IntoIterator<Item = &'a Volunteer>) -> Self {
        volunteers.into_iter().fold(AvailabilityStats::default(), |mut stats, v| {
            match v.status {
                VolunteerStatus::Available => stats.available += 1,
                VolunteerStatus::Busy => stats.busy += 1,
            }
            stats
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_validation() {
        let registration = VolunteerRegistration {
            name: " ".into(),
            role: "".into(),
            ..Default::default()
        };
        match registration.validate() {
            Err(ResqError::ValidationFailed(errors)) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_registration_starts_available() {
        let volunteer = VolunteerRegistration {
            name: "Rajesh Kumar".into(),
            role: "Medical Aid".into(),
            experience_years: 5,
            location: "Mumbai".into(),
        }
        .into_volunteer(Utc::now());
        assert!(volunteer.is_available());
        assert_eq!(volunteer.experience_years, 5);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("Busy".parse::<VolunteerStatus>().unwrap(), VolunteerStatus::Busy);
        assert!("asleep".parse::<VolunteerStatus>().is_err());
    }
}
