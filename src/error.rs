// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

/// HTTP API error with appropriate status codes and client-friendly messages.
/// The wire shape is `{"error": "<message>"}` on every failure path.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({ "error": self.message() })
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

// Convert other error types to ApiError
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::not_found("Not found"),
            other => {
                // Error message is passed through; the request log carries the detail
                tracing::error!("database error: {}", other);
                ApiError::internal_server_error(other.to_string())
            }
        }
    }
}

impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        tracing::error!("database manager error: {}", err);
        ApiError::service_unavailable("Database temporarily unavailable")
    }
}

impl From<crate::matching::MatchError> for ApiError {
    fn from(err: crate::matching::MatchError) -> Self {
        match err {
            crate::matching::MatchError::RequestNotOpen => {
                ApiError::bad_request("Request must be open to match contractors")
            }
            crate::matching::MatchError::Database(msg) => ApiError::internal_server_error(msg),
        }
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
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_uses_error_key() {
        let err = ApiError::not_found("Request not found");
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_json(), json!({ "error": "Request not found" }));
    }

    #[test]
    fn match_errors_map_to_http() {
        let err: ApiError = crate::matching::MatchError::RequestNotOpen.into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Request must be open to match contractors");

        let err: ApiError = crate::matching::MatchError::Database("boom".into()).into();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "boom");
    }
}
