// HTTP API Error Types
use axum::{
    http::{header::HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::openlibrary::CatalogError;
use crate::services::{ConstraintViolation, ServiceError};
use crate::validation::{ValidationErrors, ValidationIssue};

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        issues: Vec<ValidationIssue>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 429 Too Many Requests
    TooManyRequests(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (external service issues)
    BadGateway(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::TooManyRequests(_) => 429,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::TooManyRequests(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Error category reported in the `error` field of the body
    pub fn category(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "Bad request",
            ApiError::ValidationError { .. } => "Validation error",
            ApiError::InvalidJson(_) => "Invalid JSON",
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::NotFound(_) => "Not found",
            ApiError::Conflict(_) => "Conflict",
            ApiError::TooManyRequests(_) => "Too many requests",
            ApiError::InternalServerError(_) => "Internal server error",
            ApiError::BadGateway(_) => "Bad gateway",
            ApiError::ServiceUnavailable(_) => "Service unavailable",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError { message, issues } => json!({
                "error": self.category(),
                "message": message,
                "details": issues,
            }),
            _ => json!({
                "error": self.category(),
                "message": self.message(),
            }),
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    /// Surfaces the first issue's message and carries the full issue list
    pub fn validation(errors: ValidationErrors) -> Self {
        ApiError::ValidationError {
            message: errors.first_message().to_string(),
            issues: errors.into_issues(),
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        ApiError::TooManyRequests(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        ApiError::validation(errors)
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConfigMissing(_) | DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("Database misconfigured: {}", err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            DatabaseError::Sqlx(sqlx::Error::PoolTimedOut) | DatabaseError::Sqlx(sqlx::Error::Io(_)) => {
                tracing::error!("Database unreachable: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Query { message, source } => {
                // Don't expose internal SQL errors to clients
                tracing::error!("{}: {}", message, source);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            ServiceError::Database(db_err) => db_err.into(),
            ServiceError::Constraint(violation) => match violation {
                ConstraintViolation::DuplicateIsbn
                | ConstraintViolation::Duplicate
                | ConstraintViolation::ManualOwnership
                | ConstraintViolation::MissingReference => ApiError::bad_request(violation.to_string()),
                ConstraintViolation::LimitReached => ApiError::conflict(violation.to_string()),
                ConstraintViolation::PermissionDenied => {
                    tracing::error!("Row-level security rejected a write: {}", violation);
                    ApiError::internal_server_error(violation.to_string())
                }
            },
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::unauthorized("Invalid email or password"),
            AuthError::InvalidToken(_) | AuthError::MissingSession => {
                ApiError::unauthorized("Authentication required")
            }
            AuthError::Rejected { status, message } if (400..500).contains(&status) => {
                tracing::warn!("Auth service rejected request ({}): {}", status, message);
                ApiError::bad_request(message)
            }
            other => {
                tracing::error!("Auth service error: {}", other);
                ApiError::internal_server_error("Authentication service error")
            }
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        tracing::error!("Open Library error: {}", err);
        ApiError::bad_gateway("Open Library is unavailable, please try again later")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let mut response = (status, Json(self.to_json())).into_response();
        if let ApiError::TooManyRequests(_) = self {
            response.headers_mut().insert(
                HeaderName::from_static("x-ratelimit-remaining"),
                HeaderValue::from_static("0"),
            );
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_surfaces_first_message_and_all_details() {
        let mut errors = ValidationErrors::default();
        errors.push(&["name"], "Name cannot be empty");
        errors.push(&["manual"], "Manual must be true");

        let api_error = ApiError::from(errors);
        assert_eq!(api_error.status_code(), 400);
        let body = api_error.to_json();
        assert_eq!(body["error"], "Validation error");
        assert_eq!(body["message"], "Name cannot be empty");
        assert_eq!(body["details"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["details"][1]["path"][0], "manual");
    }

    #[test]
    fn plain_errors_have_no_details() {
        let body = ApiError::not_found("Work not found").to_json();
        assert_eq!(body["error"], "Not found");
        assert_eq!(body["message"], "Work not found");
        assert!(body.get("details").is_none());
    }

    #[test]
    fn constraint_violations_map_to_fixed_statuses() {
        let cases = [
            (ConstraintViolation::DuplicateIsbn, 400),
            (ConstraintViolation::ManualOwnership, 400),
            (ConstraintViolation::MissingReference, 400),
            (ConstraintViolation::LimitReached, 409),
            (ConstraintViolation::PermissionDenied, 500),
        ];
        for (violation, status) in cases {
            let api_error = ApiError::from(ServiceError::Constraint(violation));
            assert_eq!(api_error.status_code(), status, "{violation:?}");
        }
    }

    #[test]
    fn auth_client_errors_become_bad_requests() {
        let err = AuthError::Rejected {
            status: 422,
            message: "Password should be at least 8 characters".to_string(),
        };
        assert_eq!(ApiError::from(err).status_code(), 400);

        let err = AuthError::Rejected {
            status: 503,
            message: "upstream".to_string(),
        };
        assert_eq!(ApiError::from(err).status_code(), 500);
    }

    #[test]
    fn too_many_requests_sets_remaining_header() {
        let response = ApiError::too_many_requests("slow down").into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    }
}
