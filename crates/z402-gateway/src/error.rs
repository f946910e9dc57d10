use actix_web::{HttpResponse, ResponseError};
use std::fmt;

/// Gateway-level errors with their HTTP mappings.
///
/// Expected protocol outcomes (not yet paid, token expired, duplicate
/// event) never travel through this type — they are ordinary values.
#[derive(Debug)]
pub enum GatewayError {
    /// Malformed caller input.
    Validation(String),
    /// Webhook signature missing or invalid.
    Unauthenticated(&'static str),
    /// Intent store failure.
    Database(rusqlite::Error),
    /// Anything else that should read as a 500.
    Internal(String),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Validation(msg) => write!(f, "validation error: {}", msg),
            GatewayError::Unauthenticated(msg) => write!(f, "authentication failed: {}", msg),
            GatewayError::Database(e) => write!(f, "database error: {}", e),
            GatewayError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<rusqlite::Error> for GatewayError {
    fn from(e: rusqlite::Error) -> Self {
        GatewayError::Database(e)
    }
}

impl From<z402::Z402Error> for GatewayError {
    fn from(e: z402::Z402Error) -> Self {
        match e {
            z402::Z402Error::Validation(msg) => GatewayError::Validation(msg),
            z402::Z402Error::Authentication(_) => GatewayError::Unauthenticated("invalid signature"),
        }
    }
}

impl ResponseError for GatewayError {
    fn error_response(&self) -> HttpResponse {
        match self {
            GatewayError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "invalid_request",
                "message": msg,
            })),
            GatewayError::Unauthenticated(msg) => {
                HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "invalid_signature",
                    "message": msg,
                }))
            }
            GatewayError::Database(e) => {
                tracing::error!("Database error: {}", e);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal_error",
                    "message": "An internal error occurred",
                }))
            }
            GatewayError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal_error",
                    "message": "An internal error occurred",
                }))
            }
        }
    }
}
