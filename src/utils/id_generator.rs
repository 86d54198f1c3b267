// src/utils/id_generator.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IdType {
    Request,
    Volunteer,
    Notification,
}

impl IdType {
    pub fn to_prefix(&self) -> &'static str {
        match self {
            IdType::Request => "req",
            IdType::Volunteer => "vol",
            IdType::Notification => "not",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "req" => Some(IdType::Request),
            "vol" => Some(IdType::Volunteer),
            "not" => Some(IdType::Notification),
            _ => None,
        }
    }
}

impl fmt::Display for IdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_prefix())
    }
}

/// Alphabet for reference codes read out over the phone: no 0/O or 1/I.
const REFERENCE_ALPHABET: [char; 32] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L', 'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V',
    'W', 'X', 'Y', 'Z', '2', '3', '4', '5', '6', '7', '8', '9',
];

pub struct IdGenerator;

impl IdGenerator {
    /// Generate a unique ID with format: {prefix}-{date}-{random_suffix}
    /// Where random_suffix is 5 characters: 3 hexchars + 2 alphanumeric or 3 alphanumeric + 2 hexchars
    pub fn generate(id_type: IdType) -> String {
        Self::generate_with_timestamp(id_type, Utc::now())
    }

    /// Generate ID with a specific timestamp (useful for testing)
    pub fn generate_with_timestamp(id_type: IdType, timestamp: DateTime<Utc>) -> String {
        let date_part = timestamp.format("%y%m%d").to_string();
        let random_suffix = Self::generate_random_suffix();

        format!("{}-{}-{}", id_type.to_prefix(), date_part, random_suffix)
    }

    /// Short code a requester can quote when calling a hotline, e.g. `RQ7K2MXP4A`.
    pub fn generate_reference_code() -> String {
        format!("RQ{}", nanoid::nanoid!(8, &REFERENCE_ALPHABET))
    }

    fn generate_random_suffix() -> String {
        if rand::random::<bool>() {
            format!(
                "{}{}",
                Self::generate_hex_chars(3),
                Self::generate_alphanumeric_chars(2)
            )
        } else {
            format!(
                "{}{}",
                Self::generate_alphanumeric_chars(3),
                Self::generate_hex_chars(2)
            )
        }
    }

    fn generate_hex_chars(n: usize) -> String {
        const HEX_CHARS: &[u8] = b"0123456789abcdef";
        Self::generate_from_chars(HEX_CHARS, n)
    }

    fn generate_alphanumeric_chars(n: usize) -> String {
        const ALPHANUMERIC_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
        Self::generate_from_chars(ALPHANUMERIC_CHARS, n)
    }

    fn generate_from_chars(charset: &[u8], n: usize) -> String {
        use rand::Rng;

        let mut rng = rand::rng();
        (0..n)
            .map(|_| {
                let idx = rng.random_range(0..charset.len());
                charset[idx] as char
            })
            .collect()
    }

    /// Returns the id's type if it is well formed: a known prefix, a real
    /// calendar date and a 5-character alphanumeric suffix.
    pub fn parse_id(id: &str) -> Option<IdType> {
        let mut parts = id.split('-');
        let (prefix, date_part, random_suffix) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        if date_part.len() != 6 || random_suffix.len() != 5 {
            return None;
        }
        if !random_suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        NaiveDate::parse_from_str(date_part, "%y%m%d").ok()?;

        IdType::from_prefix(prefix)
    }

    /// Validate if an ID matches the expected format and type
    pub fn validate_id(id: &str, expected_type: Option<IdType>) -> bool {
        match Self::parse_id(id) {
            Some(id_type) => expected_type.is_none_or(|expected| id_type == expected),
            None => false,
        }
    }
}

pub trait WithGeneratedId {
    fn set_generated_id(&mut self, id_type: IdType);

    fn with_generated_id(mut self, id_type: IdType) -> Self
    where
        Self: Sized,
    {
        self.set_generated_id(id_type);
        self
    }
}

impl WithGeneratedId for crate::models::request::AidRequest {
    fn set_generated_id(&mut self, id_type: IdType) {
        self.id = IdGenerator::generate(id_type);
    }
}

impl WithGeneratedId for crate::models::volunteer::Volunteer {
    fn set_generated_id(&mut self, id_type: IdType) {
        self.id = IdGenerator::generate(id_type);
    }
}

impl WithGeneratedId for crate::models::notification::Notification {
    fn set_generated_id(&mut self, id_type: IdType) {
        self.id = IdGenerator::generate(id_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_id_generation() {
        let request_id = IdGenerator::generate(IdType::Request);
        assert!(request_id.starts_with("req-"));
        assert_eq!(request_id.split('-').count(), 3);

        let volunteer_id = IdGenerator::generate(IdType::Volunteer);
        assert!(volunteer_id.starts_with("vol-"));
    }

    #[test]
    fn test_id_parsing() {
        let test_date = Utc.with_ymd_and_hms(2025, 6, 12, 0, 0, 0).unwrap();
        let id = IdGenerator::generate_with_timestamp(IdType::Request, test_date);

        assert!(id.starts_with("req-250612-"));
        assert_eq!(IdGenerator::parse_id(&id), Some(IdType::Request));
        assert_eq!(IdGenerator::parse_id("vol-250601-or001"), Some(IdType::Volunteer));
        assert_eq!(IdGenerator::parse_id("req-250612-a1b2c-x"), None);
    }

    #[test]
    fn test_validation() {
        let valid_id = "vol-250612-a1b2c";
        assert!(IdGenerator::validate_id(valid_id, Some(IdType::Volunteer)));
        assert!(!IdGenerator::validate_id(valid_id, Some(IdType::Request)));
        assert!(IdGenerator::validate_id(valid_id, None));

        assert!(!IdGenerator::validate_id("invalid-format", None));
        assert!(!IdGenerator::validate_id("req-251312-a1b2c", None));
        assert!(!IdGenerator::validate_id("req-250612-a1/2c", None));
        // Shaped like a date but not on the calendar.
        assert!(!IdGenerator::validate_id("req-250231-a1b2c", None));
    }

    #[test]
    fn test_random_suffix_pattern() {
        for _ in 0..100 {
            let suffix = IdGenerator::generate_random_suffix();
            assert_eq!(suffix.len(), 5);
            assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()), "bad suffix: {}", suffix);
        }
    }

    #[test]
    fn test_reference_code() {
        let code = IdGenerator::generate_reference_code();
        assert!(code.starts_with("RQ"));
        assert_eq!(code.len(), 10);
        assert!(code[2..].chars().all(|c| REFERENCE_ALPHABET.contains(&c)));
    }
}
