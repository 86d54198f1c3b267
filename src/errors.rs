use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the resqnet service
#[derive(Debug, Error)]
pub enum ResqError {
    // HTTP and API errors
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Internal server error: {0}")]
    InternalServer(String),

    // Store errors
    #[error("Redis connection error: {0}")]
    RedisConnection(String),
    #[error("Redis query error: {0}")]
    RedisQuery(String),
    #[error("Store serialization error: {0}")]
    StoreSerialization(String),

    // Network and HTTP client errors
    #[error("Network request timed out")]
    NetworkTimeout,
    #[error("Network connection error: {0}")]
    NetworkConnection(String),
    #[error("HTTP client error: {0}")]
    HttpClient(String),
    #[error("Webhook delivery failed: {0}")]
    WebhookDelivery(String),

    // Serialization and parsing errors
    #[error("JSON parsing error: {0}")]
    JsonParsing(String),
    #[error("JSON serialization error: {0}")]
    JsonSerialization(String),

    // Business logic errors
    #[error("Aid request not found: {0}")]
    RequestNotFound(String),
    #[error("Volunteer not found: {0}")]
    VolunteerNotFound(String),
    #[error("Cannot move request from {from} to {to}")]
    InvalidTransition { from: String, to: String },
    #[error("Request {0} is no longer pending and cannot be changed")]
    RequestLocked(String),
    #[error("Volunteer {0} is not available")]
    VolunteerNotAvailable(String),

    // Validation errors
    #[error("Validation failed: {} errors", .0.len())]
    ValidationFailed(Vec<ValidationError>),
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),
    #[error("Invalid value '{value}' for field '{field}': {reason}")]
    InvalidFieldValue { field: String, value: String, reason: String },

    // Client submission errors
    #[error("Failed to submit request. Please try again.")]
    SubmissionFailed,

    // Configuration and setup errors
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ResqError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();
        let (error_type, details) = match self {
            ResqError::BadRequest(_) => ("bad_request", None),
            ResqError::NotFound(_) => ("not_found", None),
            ResqError::Conflict(_) => ("conflict", None),

            ResqError::ValidationFailed(errors) => ("validation_failed", serde_json::to_value(&errors).ok()),
            ResqError::MissingRequiredField(_) => ("missing_field", None),
            ResqError::InvalidFieldValue { .. } => ("invalid_field", None),

            ResqError::RequestNotFound(_) => ("request_not_found", None),
            ResqError::VolunteerNotFound(_) => ("volunteer_not_found", None),

            ResqError::InvalidTransition { .. } => ("invalid_transition", None),
            ResqError::RequestLocked(_) => ("request_locked", None),
            ResqError::VolunteerNotAvailable(_) => ("volunteer_not_available", None),

            ResqError::ServiceUnavailable(_) => ("service_unavailable", None),

            // Everything else is an internal failure
            _ => ("internal_error", None),
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, axum::Json(error_response)).into_response()
    }
}

pub type ResqResult<T> = Result<T, ResqError>;

impl From<redis::RedisError> for ResqError {
    fn from(err: redis::RedisError) -> Self {
        match err.kind() {
            redis::ErrorKind::IoError => ResqError::RedisConnection(err.to_string()),
            redis::ErrorKind::AuthenticationFailed => ResqError::RedisConnection("Authentication failed".to_string()),
            _ => ResqError::RedisQuery(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for ResqError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ResqError::NetworkTimeout
        } else if err.is_connect() {
            ResqError::NetworkConnection(err.to_string())
        } else {
            ResqError::HttpClient(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ResqError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_syntax() || err.is_data() || err.is_eof() {
            ResqError::JsonParsing(err.to_string())
        } else {
            ResqError::JsonSerialization(err.to_string())
        }
    }
}

impl ResqError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ResqError::BadRequest(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        ResqError::NotFound(resource.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        ResqError::InternalServer(msg.into())
    }

    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> Self {
        ResqError::ValidationFailed(vec![ValidationError {
            field: field.into(),
            message: message.into(),
        }])
    }

    pub fn invalid_field(field: impl Into<String>, value: impl ToString, reason: impl Into<String>) -> Self {
        ResqError::InvalidFieldValue {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn request_not_found(request_id: impl Into<String>) -> Self {
        ResqError::RequestNotFound(request_id.into())
    }

    pub fn volunteer_not_found(volunteer_id: impl Into<String>) -> Self {
        ResqError::VolunteerNotFound(volunteer_id.into())
    }

    /// Status code this error maps to over HTTP.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ResqError::BadRequest(_)
            | ResqError::ValidationFailed(_)
            | ResqError::MissingRequiredField(_)
            | ResqError::InvalidFieldValue { .. } => StatusCode::BAD_REQUEST,
            ResqError::NotFound(_) | ResqError::RequestNotFound(_) | ResqError::VolunteerNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ResqError::Conflict(_)
            | ResqError::InvalidTransition { .. }
            | ResqError::RequestLocked(_)
            | ResqError::VolunteerNotAvailable(_) => StatusCode::CONFLICT,
            ResqError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ResqError::RequestNotFound("req-250612-abc12".to_string());
        assert_eq!(error.to_string(), "Aid request not found: req-250612-abc12");

        let error = ResqError::InvalidTransition {
            from: "completed".to_string(),
            to: "accepted".to_string(),
        };
        assert_eq!(error.to_string(), "Cannot move request from completed to accepted");
    }

    #[test]
    fn test_validation_error() {
        let error = ResqError::validation_error("type", "Aid type is required");
        match error {
            ResqError::ValidationFailed(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "type");
                assert_eq!(errors[0].message, "Aid type is required");
            }
            _ => panic!("Expected ValidationFailed error"),
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ResqError::MissingRequiredField("type".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ResqError::request_not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ResqError::RequestLocked("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(ResqError::NetworkTimeout.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_response_matches_status_code() {
        let error = ResqError::VolunteerNotAvailable("vol-250612-abc12".into());
        let expected = error.status_code();
        let response = error.into_response();
        assert_eq!(response.status(), expected);
    }
}
