//! # Pricing Configuration
//!
//! The caller-facing pricing options and their normalized, validated form.
//!
//! ## Normalization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PricingConfig (raw numbers from the form)                              │
//! │    marginMode, marginPercentage, retentionEnabled, retentionPercentage  │
//! │         │                                                               │
//! │         ▼  normalize()                                                  │
//! │    NaN / ∞ ─────────────────► ValidationError (whole pass rejected)     │
//! │    margin > 1000% ──────────► ValidationError                           │
//! │    retention > 100% ────────► ValidationError                           │
//! │    negative ────────────────► clamped to 0 + QuoteWarning               │
//! │    retention disabled ──────► retention rate 0                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  PricingPolicy (exact decimal Rates)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::{validate_percentage, PercentageCheck};
use crate::warning::QuoteWarning;
use crate::{MAX_MARGIN_PERCENTAGE, MAX_RETENTION_PERCENTAGE};

// =============================================================================
// Rate
// =============================================================================

/// A percentage, kept exactly as configured (`30` means 30%).
///
/// Held as a decimal so a configured 33.333% is applied as 33.333%, not as
/// the nearest basis point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(#[ts(type = "string")] Decimal);

impl Rate {
    /// 1 basis point = 0.01%, so 3000 bps = 30%.
    pub fn from_bps(bps: u32) -> Self {
        Rate::from_decimal(Decimal::new(i64::from(bps), 2))
    }

    /// Creates a rate from a percentage as written: the shortest decimal
    /// that reads back as `pct`. Negative and non-finite inputs yield zero;
    /// callers validate first.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return Rate::zero();
        }
        pct.to_string()
            .parse::<Decimal>()
            .map(Rate::from_decimal)
            .unwrap_or_default()
    }

    /// Creates a rate from a decimal percentage. Negative values yield zero.
    pub fn from_decimal(pct: Decimal) -> Self {
        if pct.is_sign_negative() {
            return Rate::zero();
        }
        Rate(pct.normalize())
    }

    #[inline]
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0.to_f64().unwrap_or_default()
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(Decimal::ZERO)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

// =============================================================================
// Margin Mode
// =============================================================================

/// How margin is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MarginMode {
    /// Once, on the subtotal.
    #[default]
    Global,
    /// Individually on each priced line after redistribution.
    PerLine,
}

impl fmt::Display for MarginMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginMode::Global => write!(f, "global"),
            MarginMode::PerLine => write!(f, "per_line"),
        }
    }
}

impl FromStr for MarginMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" => Ok(MarginMode::Global),
            "per_line" | "per-line" | "perline" => Ok(MarginMode::PerLine),
            other => Err(ValidationError::InvalidFormat {
                field: "margin_mode".to_string(),
                reason: format!("unknown mode '{}', expected global or per_line", other),
            }),
        }
    }
}

// =============================================================================
// Pricing Config
// =============================================================================

/// Pricing options exactly as the quote form supplies them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    #[serde(default)]
    pub margin_mode: MarginMode,

    #[serde(default)]
    pub margin_percentage: f64,

    #[serde(default)]
    pub retention_enabled: bool,

    #[serde(default)]
    pub retention_percentage: f64,
}

impl PricingConfig {
    /// Validates the raw numbers and converts them into a [`PricingPolicy`].
    ///
    /// Negative percentages never produce a credit: they are clamped to zero
    /// and reported as warnings.
    pub fn normalize(&self) -> Result<(PricingPolicy, Vec<QuoteWarning>), ValidationError> {
        let mut warnings = Vec::new();

        let margin_rate = match validate_percentage(
            "margin_percentage",
            self.margin_percentage,
            MAX_MARGIN_PERCENTAGE,
        )? {
            PercentageCheck::Valid(rate) => rate,
            PercentageCheck::Clamped => {
                warn!(
                    configured = self.margin_percentage,
                    "Negative margin percentage clamped to 0"
                );
                warnings.push(QuoteWarning::PercentageClamped {
                    field: "margin_percentage".to_string(),
                    configured: self.margin_percentage,
                });
                Rate::zero()
            }
        };

        let retention_rate = if self.retention_enabled {
            match validate_percentage(
                "retention_percentage",
                self.retention_percentage,
                MAX_RETENTION_PERCENTAGE,
            )? {
                PercentageCheck::Valid(rate) if !rate.is_zero() => rate,
                PercentageCheck::Valid(_) => {
                    warnings.push(QuoteWarning::RetentionDisabled {
                        configured: self.retention_percentage,
                    });
                    Rate::zero()
                }
                PercentageCheck::Clamped => {
                    warn!(
                        configured = self.retention_percentage,
                        "Negative retention percentage clamped to 0"
                    );
                    warnings.push(QuoteWarning::PercentageClamped {
                        field: "retention_percentage".to_string(),
                        configured: self.retention_percentage,
                    });
                    warnings.push(QuoteWarning::RetentionDisabled {
                        configured: self.retention_percentage,
                    });
                    Rate::zero()
                }
            }
        } else {
            if self.retention_percentage != 0.0 {
                debug!(
                    configured = self.retention_percentage,
                    "Retention percentage ignored because retention is disabled"
                );
            }
            Rate::zero()
        };

        let policy = PricingPolicy {
            margin_mode: self.margin_mode,
            margin_rate,
            retention_rate,
        };

        Ok((policy, warnings))
    }
}

// =============================================================================
// Pricing Policy
// =============================================================================

/// Validated pricing rules used by the calculators.
///
/// `retention_rate` is zero whenever retention is disabled, so calculators
/// never need to look at the raw toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PricingPolicy {
    pub margin_mode: MarginMode,
    pub margin_rate: Rate,
    pub retention_rate: Rate,
}

impl PricingPolicy {
    pub fn global(margin_rate: Rate) -> Self {
        PricingPolicy {
            margin_mode: MarginMode::Global,
            margin_rate,
            retention_rate: Rate::zero(),
        }
    }

    pub fn per_line(margin_rate: Rate) -> Self {
        PricingPolicy {
            margin_mode: MarginMode::PerLine,
            margin_rate,
            retention_rate: Rate::zero(),
        }
    }

    pub fn with_retention(mut self, retention_rate: Rate) -> Self {
        self.retention_rate = retention_rate;
        self
    }

    #[inline]
    pub fn retention_enabled(&self) -> bool {
        !self.retention_rate.is_zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
