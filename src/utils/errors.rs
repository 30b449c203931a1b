//! Sistema de manejo de errores
//!
//! Este módulo define todos los tipos de errores del sistema
//! y su conversión a respuestas HTTP apropiadas.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::services::payment_gateway::GatewayError;

/// Errores principales de la aplicación
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Booking overlap: {conflicts} conflicting bookings for the selected dates")]
    BookingOverlap { conflicts: i64 },

    #[error("Cannot {action} a booking in status '{current}'")]
    IllegalTransition { action: String, current: String },

    #[error("Booking cannot be modified: {0}")]
    BookingNotModifiable(String),

    #[error("Booking cannot be cancelled: {0}")]
    BookingNotCancellable(String),

    #[error("Payment processing error: {0}")]
    PaymentProcessing(#[from] GatewayError),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Hash error: {0}")]
    Hash(String),
}

impl AppError {
    /// Crear un error de transición ilegal del ciclo de vida de la reserva
    pub fn illegal_transition(action: &str, current: &str) -> Self {
        AppError::IllegalTransition {
            action: action.to_string(),
            current: current.to_string(),
        }
    }

    /// Crear un error de solapamiento de reservas
    pub fn booking_overlap(conflicts: i64) -> Self {
        AppError::BookingOverlap { conflicts }
    }
}

/// Respuesta de error para la API
#[derive(Debug, serde::Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::Database(e) => {
                eprintln!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database Error".to_string(),
                        message: "An error occurred while accessing the database".to_string(),
                        details: Some(json!({ "sql_error": e.to_string() })),
                        code: Some("DB_ERROR".to_string()),
                    },
                )
            }

            AppError::Validation(e) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Validation Error".to_string(),
                    message: "The provided data is invalid".to_string(),
                    details: Some(json!(e)),
                    code: Some("VALIDATION_ERROR".to_string()),
                },
            ),

            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: "Unauthorized".to_string(),
                    message: msg,
                    details: None,
                    code: Some("UNAUTHORIZED".to_string()),
                },
            ),

            AppError::Forbidden(msg) => (
                StatusCode::FORBIDDEN,
                ErrorResponse {
                    error: "Forbidden".to_string(),
                    message: msg,
                    details: None,
                    code: Some("FORBIDDEN".to_string()),
                },
            ),

            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: "Not Found".to_string(),
                    message: msg,
                    details: None,
                    code: Some("NOT_FOUND".to_string()),
                },
            ),

            AppError::Conflict(msg) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: "Conflict".to_string(),
                    message: msg,
                    details: None,
                    code: Some("CONFLICT".to_string()),
                },
            ),

            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "Bad Request".to_string(),
                    message: msg,
                    details: None,
                    code: Some("BAD_REQUEST".to_string()),
                },
            ),

            AppError::BookingOverlap { conflicts } => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: "Booking Overlap".to_string(),
                    message: "The vehicle is already booked for the selected dates".to_string(),
                    details: Some(json!({ "conflicting_bookings": conflicts })),
                    code: Some("BOOKING_OVERLAP".to_string()),
                },
            ),

            AppError::IllegalTransition { action, current } => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: "Illegal Transition".to_string(),
                    message: format!("Cannot {} a booking in status '{}'", action, current),
                    details: Some(json!({ "action": action, "current_status": current })),
                    code: Some("ILLEGAL_TRANSITION".to_string()),
                },
            ),

            AppError::BookingNotModifiable(msg) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: "Booking Not Modifiable".to_string(),
                    message: msg,
                    details: None,
                    code: Some("BOOKING_NOT_MODIFIABLE".to_string()),
                },
            ),

            AppError::BookingNotCancellable(msg) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: "Booking Not Cancellable".to_string(),
                    message: msg,
                    details: None,
                    code: Some("BOOKING_NOT_CANCELLABLE".to_string()),
                },
            ),

            AppError::PaymentProcessing(e) => {
                eprintln!("Payment processing error: {}", e);
                let status = match &e {
                    GatewayError::Declined(_) => StatusCode::PAYMENT_REQUIRED,
                    GatewayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                    GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                    GatewayError::AuthFailure | GatewayError::Network(_) => StatusCode::BAD_GATEWAY,
                };
                (
                    status,
                    ErrorResponse {
                        error: "Payment Processing Error".to_string(),
                        message: e.to_string(),
                        details: Some(json!({ "retryable": e.is_retryable() })),
                        code: Some(e.code().to_string()),
                    },
                )
            }

            AppError::Internal(msg) => {
                eprintln!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal Server Error".to_string(),
                        message: "An unexpected error occurred".to_string(),
                        details: Some(json!({ "internal_error": msg })),
                        code: Some("INTERNAL_ERROR".to_string()),
                    },
                )
            }

            AppError::Jwt(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: "JWT Error".to_string(),
                    message: msg,
                    details: None,
                    code: Some("JWT_ERROR".to_string()),
                },
            ),

            AppError::Hash(msg) => {
                eprintln!("Hash error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Hash Error".to_string(),
                        message: "An error occurred while processing credentials".to_string(),
                        details: Some(json!({ "hash_error": msg })),
                        code: Some("HASH_ERROR".to_string()),
                    },
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Resultado tipado para operaciones que pueden fallar
pub type AppResult<T> = Result<T, AppError>;

/// Función helper para crear errores de validación sobre un campo
pub fn validation_error(field: &'static str, message: &'static str) -> AppError {
    use validator::ValidationError;

    let mut error = ValidationError::new("custom");
    error.add_param("field".into(), &field);
    error.add_param("message".into(), &message);

    let mut errors = validator::ValidationErrors::new();
    errors.add(field, error);

    AppError::Validation(errors)
}

/// Función helper para crear errores de recurso no encontrado
pub fn not_found_error(resource: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} with id '{}' not found", resource, id))
}

/// Función helper para crear errores de conflicto
pub fn conflict_error(resource: &str, field: &str, value: &str) -> AppError {
    AppError::Conflict(format!("{} with {} '{}' already exists", resource, field, value))
}

/// Función helper para crear errores de acceso prohibido
pub fn forbidden_error(operation: &str, reason: &str) -> AppError {
    AppError::Forbidden(format!("Cannot {}: {}", operation, reason))
}
