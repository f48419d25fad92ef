//! # Error Types
//!
//! Domain-specific error types for barberia-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  barberia-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations, not-found lookups     │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  barberia-db errors (separate crate)                                    │
//! │  └── DbError          - Snapshot persistence failures                   │
//! │                                                                         │
//! │  Front desk API errors (in app)                                         │
//! │  └── ApiError         - What the UI sees (serialized)                   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → UI                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every core operation validates before it mutates, so any error returned
//! here means the snapshot was left untouched.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    // -------------------------------------------------------------------------
    // Not found
    // -------------------------------------------------------------------------
    /// Service code is not in the active catalog.
    ///
    /// ## When This Occurs
    /// - A stale UI still offers a service the owner deactivated
    /// - A typo'd code arrives from an imported snapshot
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// Reward id is not in the catalog.
    #[error("Reward not found: {0}")]
    RewardNotFound(u32),

    /// No customer with this phone.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Appointment not found: {0}")]
    AppointmentNotFound(String),

    /// Barber id unknown or barber inactive.
    #[error("Barber not found: {0}")]
    BarberNotFound(u32),

    // -------------------------------------------------------------------------
    // State machine
    // -------------------------------------------------------------------------
    /// Order is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Confirming payment twice for the same order
    /// - Recording a tip against an order that was never paid
    ///
    /// ## User Workflow
    /// ```text
    /// "Pago confirmado" (order already PAID)
    ///      │
    ///      ▼
    /// InvalidOrderStatus { order_id, current_status: "PAID" }
    ///      │
    ///      ▼
    /// No stamps credited, nothing persisted
    /// ```
    #[error("Order {order_id} is {current_status}, cannot perform operation")]
    InvalidOrderStatus {
        order_id: String,
        current_status: String,
    },

    /// Appointment is not in a state that allows the requested operation.
    #[error("Appointment {appointment_id} is {current_status}, cannot perform operation")]
    InvalidAppointmentStatus {
        appointment_id: String,
        current_status: String,
    },

    /// Appointment already produced an order.
    #[error("Appointment {appointment_id} already has order {order_id}")]
    AppointmentAlreadyBilled {
        appointment_id: String,
        order_id: String,
    },

    // -------------------------------------------------------------------------
    // Balances
    // -------------------------------------------------------------------------
    /// Stamp balance does not cover the requested reward.
    #[error("Insufficient stamps: available {available}, required {required}")]
    InsufficientStamps { available: u32, required: u32 },

    /// Credit balance does not cover the credit locked into an order.
    #[error("Insufficient credit: available {available}, required {required}")]
    InsufficientCredit { available: Money, required: Money },

    /// Reward exists but this customer may not use it right now.
    #[error("Reward {reward_id} not available: {reason}")]
    RewardNotEligible { reward_id: u32, reason: String },

    // -------------------------------------------------------------------------
    // Scheduling / access
    // -------------------------------------------------------------------------
    /// Barber already has an active appointment within the conflict window.
    #[error("Barber {barber_id} is already booked near {scheduled_at}")]
    BookingConflict {
        barber_id: u32,
        scheduled_at: String,
    },

    /// Role is not allowed to perform the action.
    #[error("{role} is not allowed to {action}")]
    PermissionDenied { role: String, action: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// True for the not-found family.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::ServiceNotFound(_)
                | CoreError::RewardNotFound(_)
                | CoreError::CustomerNotFound(_)
                | CoreError::OrderNotFound(_)
                | CoreError::AppointmentNotFound(_)
                | CoreError::BarberNotFound(_)
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., phone with too few digits).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Time lies in the past.
    #[error("{field} cannot be in the past")]
    InPast { field: String },

    /// Duplicate value (e.g., phone already registered).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStamps {
            available: 4,
            required: 6,
        };
        assert_eq!(err.to_string(), "Insufficient stamps: available 4, required 6");

        let err = CoreError::InsufficientCredit {
            available: Money::from_pesos(5_000),
            required: Money::from_pesos(15_000),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient credit: available $5.000, required $15.000"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "services".to_string(),
        };
        assert_eq!(err.to_string(), "services is required");

        let err = ValidationError::InPast {
            field: "scheduled_at".to_string(),
        };
        assert_eq!(err.to_string(), "scheduled_at cannot be in the past");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "phone".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert!(!core_err.is_not_found());
    }

    #[test]
    fn test_not_found_family() {
        assert!(CoreError::ServiceNotFound("PERM".into()).is_not_found());
        assert!(CoreError::RewardNotFound(99).is_not_found());
        assert!(!CoreError::InsufficientStamps {
            available: 0,
            required: 1
        }
        .is_not_found());
    }
}
