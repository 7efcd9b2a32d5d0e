//! # Margin & Retention Calculator
//!
//! ## Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Global     margin = subtotal × rate                                    │
//! │             (shown as its own row of the breakdown)                     │
//! │                                                                         │
//! │  PerLine    margin = Σ round(base_i × rate)                             │
//! │             base_i = each breakdown row's cost AFTER redistribution     │
//! │             Σ base_i must equal the subtotal                            │
//! │                                                                         │
//! │  Both       retention = (subtotal + margin) × retention rate            │
//! │             total     = subtotal + margin − retention                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rates are exact decimal percentages; each amount is rounded once, half
//! away from zero.
//!
//! Per-line mode takes its bases from the Redistributor, global mode only
//! from the subtotal. There is exactly one margin number per quote.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::{MarginMode, PricingPolicy, Rate};
use crate::summary::CategoryCosts;

/// Result of applying margin and retention to a subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct MarginOutcome {
    pub margin_amount: Money,
    pub retention_amount: Money,
    pub total: Money,
    /// Margin of each base, in base order. Empty in global mode.
    pub per_line_margins: Vec<Money>,
}

/// Applies the margin and retention policy.
///
/// `per_line_bases` are the breakdown rows' pre-margin costs. When they are
/// absent in per-line mode, the category costs serve as bases.
///
/// ## Errors
/// [`CoreError::InconsistentPricingBases`] when the bases or the category
/// costs do not add up to `subtotal`.
///
/// ## Example
/// ```rust
/// use gala_core::margin::apply_margin_and_retention;
/// use gala_core::money::Money;
/// use gala_core::pricing::{PricingPolicy, Rate};
/// use gala_core::summary::CategoryCosts;
///
/// let costs = CategoryCosts {
///     labor: Money::from_minor(1_000_000),
///     products: Money::from_minor(500_000),
///     transport: Money::from_minor(100_000),
///     ..CategoryCosts::default()
/// };
/// let policy = PricingPolicy::global(Rate::from_bps(3000));
/// let outcome = apply_margin_and_retention(costs.total(), &costs, None, &policy).unwrap();
///
/// assert_eq!(outcome.margin_amount.minor(), 480_000);
/// assert_eq!(outcome.total.minor(), 2_080_000);
/// ```
pub fn apply_margin_and_retention(
    subtotal: Money,
    category_costs: &CategoryCosts,
    per_line_bases: Option<&[Money]>,
    policy: &PricingPolicy,
) -> CoreResult<MarginOutcome> {
    ensure_partition(subtotal, category_costs.total())?;

    let (margin_amount, per_line_margins) = match policy.margin_mode {
        MarginMode::Global => (rate_of(subtotal, policy.margin_rate, "margin_amount")?, Vec::new()),
        MarginMode::PerLine => {
            let bases: Vec<Money> = match per_line_bases {
                Some(bases) => bases.to_vec(),
                None => category_costs.iter().map(|(_, cost)| cost).collect(),
            };
            ensure_partition(subtotal, bases.iter().sum::<Money>())?;

            let margins = bases
                .iter()
                .map(|base| rate_of(*base, policy.margin_rate, "margin_amount"))
                .collect::<CoreResult<Vec<Money>>>()?;
            let margin = margins
                .iter()
                .try_fold(Money::zero(), |acc, m| acc.checked_add(*m))
                .ok_or_else(|| too_large("margin_amount"))?;
            (margin, margins)
        }
    };

    let gross = subtotal
        .checked_add(margin_amount)
        .ok_or_else(|| too_large("total"))?;
    let retention_amount = if policy.retention_enabled() {
        rate_of(gross, policy.retention_rate, "retention_amount")?
    } else {
        Money::zero()
    };

    Ok(MarginOutcome {
        margin_amount,
        retention_amount,
        total: gross - retention_amount,
        per_line_margins,
    })
}

fn rate_of(amount: Money, rate: Rate, field: &str) -> CoreResult<Money> {
    amount
        .checked_apply_rate(rate)
        .ok_or_else(|| too_large(field))
}

fn too_large(field: &str) -> CoreError {
    ValidationError::TooLarge {
        field: field.to_string(),
    }
    .into()
}

fn ensure_partition(expected: Money, actual: Money) -> CoreResult<()> {
    if expected != actual {
        return Err(CoreError::InconsistentPricingBases { expected, actual });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
