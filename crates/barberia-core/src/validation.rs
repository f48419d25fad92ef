//! # Validation Module
//!
//! Input validation for front desk operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI form                                                       │
//! │  └── Immediate feedback (empty fields, digits only)                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Core operation (Rust)                                         │
//! │  └── THIS MODULE: normalization + business rule checks                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Snapshot is only touched after every check has passed                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use barberia_core::validation::{validate_phone, validate_email};
//!
//! assert_eq!(validate_phone("+57 300 123-4567").unwrap(), "573001234567");
//! assert_eq!(
//!     validate_email(Some("  Ana@Mail.COM ")).unwrap().as_deref(),
//!     Some("ana@mail.com")
//! );
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_AMOUNT_PESOS, MAX_NAME_LEN, MAX_PHONE_DIGITS, MIN_PHONE_DIGITS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Phone
// =============================================================================

/// Strips everything but ASCII digits.
///
/// ## Example
/// ```rust
/// use barberia_core::validation::normalize_phone;
///
/// assert_eq!(normalize_phone("(300) 123 4567"), "3001234567");
/// ```
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalizes and validates a customer phone.
///
/// ## Rules
/// - Non-digits are dropped
/// - 7 to 15 digits must remain
///
/// ## Returns
/// The normalized phone, ready to use as the customer key.
pub fn validate_phone(raw: &str) -> ValidationResult<String> {
    let phone = normalize_phone(raw);

    if phone.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    if phone.len() < MIN_PHONE_DIGITS || phone.len() > MAX_PHONE_DIGITS {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: format!(
                "must have between {} and {} digits",
                MIN_PHONE_DIGITS, MAX_PHONE_DIGITS
            ),
        });
    }

    Ok(phone)
}

// =============================================================================
// Customer Profile
// =============================================================================

/// Validates a display name and returns it trimmed.
pub fn validate_customer_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

/// Trims and lowercases an optional email.
///
/// Blank input clears the email (`Ok(None)`).
pub fn validate_email(email: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(email) = email.map(str::trim).filter(|e| !e.is_empty()) else {
        return Ok(None);
    };
    let email = email.to_lowercase();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain.tld".to_string(),
        });
    }

    Ok(Some(email))
}

// =============================================================================
// Selections & Amounts
// =============================================================================

/// At least one service must be selected.
pub fn validate_services_selected(services: &[String]) -> ValidationResult<()> {
    if services.iter().all(|code| code.trim().is_empty()) {
        return Err(ValidationError::Required {
            field: "services".to_string(),
        });
    }

    Ok(())
}

fn amount_out_of_range(field: &str, min: i64) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min,
        max: MAX_AMOUNT_PESOS,
    }
}

/// Catalog prices may be zero (courtesy services) but never negative,
/// and never above [`MAX_AMOUNT_PESOS`].
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() || price.pesos() > MAX_AMOUNT_PESOS {
        return Err(amount_out_of_range("price", 0));
    }

    Ok(())
}

/// Amount must be strictly positive and at most [`MAX_AMOUNT_PESOS`]
/// (tips, reward credit values).
pub fn validate_positive_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    if amount.pesos() > MAX_AMOUNT_PESOS {
        return Err(amount_out_of_range(field, 1));
    }

    Ok(())
}

/// Signed correction of at most [`MAX_AMOUNT_PESOS`] either way.
pub fn validate_amount_delta(field: &str, delta: Money) -> ValidationResult<()> {
    if delta.pesos().unsigned_abs() > MAX_AMOUNT_PESOS.unsigned_abs() {
        return Err(amount_out_of_range(field, -MAX_AMOUNT_PESOS));
    }

    Ok(())
}

/// Rewards must cost at least one stamp.
pub fn validate_stamp_cost(stamp_cost: u32) -> ValidationResult<()> {
    if stamp_cost == 0 {
        return Err(ValidationError::MustBePositive {
            field: "stamp_cost".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert_eq!(validate_phone("3001234567").unwrap(), "3001234567");
        assert_eq!(validate_phone("+57 (300) 123-4567").unwrap(), "573001234567");
        assert_eq!(validate_phone("1234567").unwrap(), "1234567");

        assert!(matches!(
            validate_phone(""),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_phone("abc"),
            Err(ValidationError::Required { .. })
        ));
        assert!(matches!(
            validate_phone("123456"),
            Err(ValidationError::InvalidFormat { .. })
        ));
        assert!(validate_phone("1234567890123456").is_err());
    }

    #[test]
    fn test_validate_customer_name() {
        assert_eq!(validate_customer_name("  Ana Gomez ").unwrap(), "Ana Gomez");
        assert!(validate_customer_name("   ").is_err());
        assert!(validate_customer_name(&"x".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(None).unwrap(), None);
        assert_eq!(validate_email(Some("   ")).unwrap(), None);
        assert_eq!(
            validate_email(Some("Juan@Example.co")).unwrap().as_deref(),
            Some("juan@example.co")
        );
        assert!(validate_email(Some("juan")).is_err());
        assert!(validate_email(Some("@example.com")).is_err());
        assert!(validate_email(Some("juan@example")).is_err());
        assert!(validate_email(Some("a@b@c.com")).is_err());
    }

    #[test]
    fn test_validate_services_selected() {
        assert!(validate_services_selected(&["BEARD".to_string()]).is_ok());
        assert!(validate_services_selected(&[]).is_err());
        assert!(validate_services_selected(&["  ".to_string()]).is_err());
    }

    #[test]
    fn test_amounts() {
        assert!(validate_price(Money::zero()).is_ok());
        assert!(validate_price(Money::from_pesos(-1)).is_err());
        assert!(validate_price(Money::from_pesos(MAX_AMOUNT_PESOS)).is_ok());
        assert!(matches!(
            validate_price(Money::from_pesos(i64::MAX)),
            Err(ValidationError::OutOfRange { .. })
        ));
        assert!(validate_positive_amount("tip", Money::from_pesos(5_000)).is_ok());
        assert!(validate_positive_amount("tip", Money::zero()).is_err());
        assert!(validate_positive_amount("tip", Money::from_pesos(MAX_AMOUNT_PESOS + 1)).is_err());
        assert!(validate_amount_delta("credit", Money::from_pesos(-MAX_AMOUNT_PESOS)).is_ok());
        assert!(validate_amount_delta("credit", Money::from_pesos(i64::MIN)).is_err());
        assert!(validate_stamp_cost(1).is_ok());
        assert!(validate_stamp_cost(0).is_err());
    }
}
