//! # API Error Type
//!
//! Unified error type for front desk commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in the Front Desk                         │
//! │                                                                         │
//! │  Command Function ── Result<T, ApiError>                                │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Core rule broken? ─── CoreError::InsufficientStamps ──┐                │
//! │         │                                              │                │
//! │         ▼                                              ▼                │
//! │  Store failed? ─────── DbError::QueryFailed("...") ── ApiError ──► UI   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Success ─────────────────────────────────────────────────────────► UI  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The UI receives a machine-readable `code` and a message it can show as-is.
//! Internal details (SQL errors, paths) are logged, never returned.

use serde::Serialize;
use barberia_core::CoreError;
use barberia_db::DbError;

/// API error returned from front desk commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_BALANCE",
///   "message": "Insufficient stamps: available 3, required 8"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Database operation failed (500)
    DatabaseError,

    /// Order or appointment in the wrong state (422)
    BusinessLogic,

    /// Barber already booked in the slot (409)
    Conflict,

    /// Not enough stamps or credit
    InsufficientBalance,

    /// Role may not perform the action (403)
    PermissionDenied,

    /// Payment link could not be produced
    PaymentError,

    /// Internal server error (500)
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::Serialization(e) => {
                tracing::error!("Snapshot serialization failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Could not store data")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        if err.is_not_found() {
            tracing::warn!("{}", err);
            return ApiError::new(ErrorCode::NotFound, err.to_string());
        }

        let code = match &err {
            CoreError::InsufficientStamps { .. } | CoreError::InsufficientCredit { .. } => {
                ErrorCode::InsufficientBalance
            }
            CoreError::InvalidOrderStatus { .. }
            | CoreError::InvalidAppointmentStatus { .. }
            | CoreError::AppointmentAlreadyBilled { .. }
            | CoreError::RewardNotEligible { .. } => ErrorCode::BusinessLogic,
            CoreError::BookingConflict { .. } => ErrorCode::Conflict,
            CoreError::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            CoreError::Validation(_) => ErrorCode::ValidationError,
            _ => ErrorCode::Internal,
        };

        match err {
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
            other => ApiError::new(code, other.to_string()),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use barberia_core::ValidationError;

    #[test]
    fn test_core_error_codes() {
        let err: ApiError = CoreError::CustomerNotFound("3001234567".into()).into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.contains("3001234567"));

        let err: ApiError = CoreError::InsufficientStamps {
            available: 3,
            required: 8,
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientBalance);

        let err: ApiError = CoreError::BookingConflict {
            barber_id: 1,
            scheduled_at: "2026-10-16T15:00:00Z".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::Conflict);

        let err: ApiError = CoreError::PermissionDenied {
            role: "barber".into(),
            action: "delete customer".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::PermissionDenied);

        let err: ApiError = CoreError::Validation(ValidationError::Required {
            field: "name".into(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_db_error_hides_details() {
        let err: ApiError = DbError::QueryFailed("no such table: snapshots".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("snapshots"));
    }

    #[test]
    fn test_serialization_shape() {
        let err = ApiError::not_found("Order", "o-1");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Order not found: o-1");
    }
}
