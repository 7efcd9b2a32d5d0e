//! # Error Types
//!
//! Domain-specific error types for gala-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gala-core errors (this file)                                           │
//! │  ├── CoreError        - Rejects a whole computation pass                │
//! │  └── ValidationError  - Malformed or out-of-range input                 │
//! │                                                                         │
//! │  gala-core warnings (warning.rs)                                        │
//! │  └── QuoteWarning     - Non-fatal: clamped %, mismatch, legacy data     │
//! │                                                                         │
//! │  gala-cli errors (app)                                                  │
//! │  └── CliError         - Wraps CoreError + file/parse failures           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → CliError → stderr                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. An error means NO partial result: the aggregate is all-or-nothing
//! 2. Include the offending field or catalog id in the message
//! 3. Distribution gaps and reconciliation mismatches are warnings, never errors

use thiserror::Error;

use crate::line_item::Category;
use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Errors that reject a computation pass.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A line item references a catalog id the snapshot does not contain.
    ///
    /// ## When This Occurs
    /// - The catalog entry was deleted after the quote was composed
    /// - The caller forgot to overlay synthesized entries from rehydration
    #[error("{category} catalog entry not found: {id}")]
    CatalogEntryNotFound { category: Category, id: String },

    /// Per-line pricing bases handed to the margin calculator do not add up
    /// to the subtotal they are supposed to partition.
    #[error("Per-line bases sum to {actual}, expected subtotal {expected}")]
    InconsistentPricingBases { expected: Money, actual: Money },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Value must be greater than zero.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: f64, max: f64 },

    /// NaN or infinity where a number was expected.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    /// Arithmetic on this field would overflow the money range.
    #[error("{field} is too large to price")]
    TooLarge { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., the same product listed twice).
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
