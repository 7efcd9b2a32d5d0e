//! # Validation Module
//!
//! Input validation for quote composition.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Quote form (UI collaborator)                                  │
//! │  └── Immediate feedback while typing                                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Deserialization (serde)                                       │
//! │  └── Shape and type checks                                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: THIS MODULE                                                   │
//! │  ├── Negative quantities, prices, hours                                 │
//! │  ├── Missing ids                                                        │
//! │  └── Percentages (NaN, out of range, negative → clamp)                  │
//! │                                                                         │
//! │  Any Layer 3 failure rejects the whole pass: no partial CostSummary.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gala_core::validation::{validate_id, validate_quantity};
//! use rust_decimal::Decimal;
//!
//! validate_id("product_id", "stage-lights").unwrap();
//! assert!(validate_quantity("quantity", Decimal::NEGATIVE_ONE).is_err());
//! ```

use rust_decimal::prelude::*;

use crate::error::ValidationError;
use crate::money::Money;
use crate::pricing::Rate;
use crate::MAX_HOURS_PER_DAY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates a catalog or product identifier.
///
/// ## Rules
/// - Must not be empty or whitespace
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a UUID string format (saved quote ids).
///
/// ## Example
/// ```rust
/// use gala_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    validate_id("id", id)?;

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity, duration or weight.
///
/// ## Rules
/// - Must be zero or greater (zero is a line that prices to nothing)
pub fn validate_quantity(field: &str, quantity: Decimal) -> ValidationResult<()> {
    if quantity.is_sign_negative() && !quantity.is_zero() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates the hours worked per day.
///
/// ## Rules
/// - Between zero and [`MAX_HOURS_PER_DAY`]
pub fn validate_hours(hours: Decimal) -> ValidationResult<()> {
    validate_quantity("hours", hours)?;

    if hours > MAX_HOURS_PER_DAY {
        return Err(ValidationError::OutOfRange {
            field: "hours".to_string(),
            min: 0.0,
            max: MAX_HOURS_PER_DAY.to_f64().unwrap_or(24.0),
        });
    }

    Ok(())
}

/// Validates a number of event days.
///
/// ## Rules
/// - Must be at least 1
pub fn validate_days(days: u32) -> ValidationResult<()> {
    if days == 0 {
        return Err(ValidationError::MustBePositive {
            field: "days".to_string(),
        });
    }

    Ok(())
}

/// Validates an override or catalog price.
///
/// ## Example
/// ```rust
/// use gala_core::money::Money;
/// use gala_core::validation::validate_price;
///
/// assert!(validate_price("override_price", Money::from_minor(0)).is_ok());
/// assert!(validate_price("override_price", Money::from_minor(-100)).is_err());
/// ```
pub fn validate_price(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Outcome of a percentage check that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PercentageCheck {
    /// Within `[0, max]`.
    Valid(Rate),
    /// Negative; the caller treats it as zero and reports a warning.
    Clamped,
}

/// Validates a configured percentage.
///
/// ## Rules
/// - NaN / infinity → error
/// - Negative → [`PercentageCheck::Clamped`] (never a credit)
/// - Above `max` → error
pub fn validate_percentage(field: &str, value: f64, max: f64) -> ValidationResult<PercentageCheck> {
    if !value.is_finite() {
        return Err(ValidationError::NotFinite {
            field: field.to_string(),
        });
    }

    if value < 0.0 {
        return Ok(PercentageCheck::Clamped);
    }

    if value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0.0,
            max,
        });
    }

    Ok(PercentageCheck::Valid(Rate::from_percentage(value)))
}

// =============================================================================
// Unit Tests
// =============================================================================
