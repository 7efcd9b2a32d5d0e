//! # Quote Pipeline
//!
//! One pure pass from line-item inputs to everything the export layer needs.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PricingConfig ──normalize──► PricingPolicy (+ warnings)                │
//! │                                                                         │
//! │  inputs ──► price_items ──► PricedQuote (summary, margin = 0)          │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │            redistribute ──► CostBreakdown (margin = 0)                 │
//! │                 │                                                       │
//! │                 ▼  bases = breakdown.pricing_bases()  (per-line only)   │
//! │      apply_margin_and_retention ──► MarginOutcome                      │
//! │                 │                                                       │
//! │                 ├──► summary.with_margin()     (figure of record)       │
//! │                 └──► breakdown.apply_margin()  (advisory)               │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │              verify ──► Reconciliation                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation failures reject the pass. Everything after pricing only adds
//! warnings, so a valid quote always yields its summary.

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::aggregate::{price_items, PricedQuote};
use crate::catalog::CatalogLookup;
use crate::error::CoreResult;
use crate::line_item::LineItemInput;
use crate::margin::apply_margin_and_retention;
use crate::money::Money;
use crate::pricing::{MarginMode, PricingConfig, PricingPolicy};
use crate::reconcile::{verify, Reconciliation};
use crate::redistribute::{redistribute, CostBreakdown};
use crate::summary::CostSummary;
use crate::warning::QuoteWarning;
use crate::DEFAULT_TOLERANCE_PER_LINE;

/// Options for a computation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QuoteOptions {
    /// Allowed rounding drift per breakdown row.
    pub tolerance_per_line: Money,
}

impl Default for QuoteOptions {
    fn default() -> Self {
        QuoteOptions {
            tolerance_per_line: DEFAULT_TOLERANCE_PER_LINE,
        }
    }
}

/// Everything handed to the export collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QuoteComputation {
    /// The figure of record.
    pub summary: CostSummary,
    /// Itemized view; advisory when `reconciliation` is a mismatch.
    pub breakdown: CostBreakdown,
    pub reconciliation: Reconciliation,
    pub warnings: Vec<QuoteWarning>,
}

impl QuoteComputation {
    /// The breakdown, unless it is known to be inconsistent or unavailable.
    pub fn trusted_breakdown(&self) -> Option<&CostBreakdown> {
        (self.reconciliation.is_ok() && self.breakdown.is_distributable()).then_some(&self.breakdown)
    }
}

/// Computes a quote.
///
/// ## Example
/// ```rust
/// use gala_core::catalog::{CatalogSnapshot, ProductEntry};
/// use gala_core::line_item::{LineItemInput, ProductInput};
/// use gala_core::money::Money;
/// use gala_core::pricing::PricingConfig;
/// use gala_core::quote::{compute_quote, QuoteOptions};
/// use rust_decimal::Decimal;
///
/// let catalog = CatalogSnapshot {
///     products: vec![ProductEntry {
///         id: "cake".into(),
///         name: "Cake".into(),
///         unit_price: Money::from_minor(10_000),
///     }],
///     ..CatalogSnapshot::default()
/// };
/// let inputs = vec![LineItemInput::Product(ProductInput {
///     product_id: "cake".into(),
///     quantity: Decimal::from(3),
///     override_price: None,
/// })];
/// let config = PricingConfig {
///     margin_percentage: 10.0,
///     ..PricingConfig::default()
/// };
///
/// let quote = compute_quote(&inputs, &catalog, &config, &QuoteOptions::default()).unwrap();
/// assert_eq!(quote.summary.total.minor(), 33_000);
/// assert!(quote.reconciliation.is_ok());
/// ```
pub fn compute_quote<C: CatalogLookup + ?Sized>(
    inputs: &[LineItemInput],
    catalog: &C,
    config: &PricingConfig,
    options: &QuoteOptions,
) -> CoreResult<QuoteComputation> {
    let (policy, warnings) = config.normalize()?;
    let priced = price_items(inputs, catalog)?;
    finish(&priced, &policy, warnings, options)
}

/// Computes a quote from items that are already priced.
///
/// Callers that also need the [`PricedQuote`] (to persist it, say) price
/// once and hand the result here.
pub fn compute_priced(
    priced: &PricedQuote,
    config: &PricingConfig,
    options: &QuoteOptions,
) -> CoreResult<QuoteComputation> {
    let (policy, warnings) = config.normalize()?;
    finish(priced, &policy, warnings, options)
}

fn finish(
    priced: &PricedQuote,
    policy: &PricingPolicy,
    mut warnings: Vec<QuoteWarning>,
    options: &QuoteOptions,
) -> CoreResult<QuoteComputation> {
    warnings.extend(priced.warnings.iter().cloned());

    let redistribution = redistribute(&priced.items);
    warnings.extend(redistribution.warnings);
    let mut breakdown = redistribution.breakdown;

    let bases = match policy.margin_mode {
        MarginMode::PerLine => Some(breakdown.pricing_bases()),
        MarginMode::Global => None,
    };
    let outcome = apply_margin_and_retention(
        priced.summary.subtotal,
        &priced.summary.category_costs,
        bases.as_deref(),
        policy,
    )?;

    let summary = priced.summary.clone().with_margin(&outcome, policy);
    breakdown.apply_margin(&outcome, policy.margin_mode);

    let reconciliation = verify(&breakdown, &summary, options.tolerance_per_line);
    warnings.extend(reconciliation.to_warning());

    debug!(
        subtotal = %summary.subtotal,
        margin = %summary.margin_amount,
        retention = %summary.retention_amount,
        total = %summary.total,
        lines = breakdown.lines.len(),
        reconciled = reconciliation.is_ok(),
        "Quote computed"
    );

    Ok(QuoteComputation {
        summary,
        breakdown,
        reconciliation,
        warnings,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogSnapshot, ProductEntry, TransportZone};
    use crate::error::CoreError;
    use crate::line_item::{ProductInput, TransportInput};
    use rust_decimal::Decimal;

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot {
            products: vec![
                ProductEntry {
                    id: "a".to_string(),
                    name: "A".to_string(),
                    unit_price: Money::from_minor(333),
                },
                ProductEntry {
                    id: "b".to_string(),
                    name: "B".to_string(),
                    unit_price: Money::from_minor(333),
                },
                ProductEntry {
                    id: "c".to_string(),
                    name: "C".to_string(),
                    unit_price: Money::from_minor(333),
                },
            ],
            transport_zones: vec![TransportZone {
                id: "north".to_string(),
                name: "North".to_string(),
                cost_per_trip: Money::from_minor(1_000),
            }],
            ..CatalogSnapshot::default()
        }
    }

    fn inputs() -> Vec<LineItemInput> {
        let mut inputs: Vec<LineItemInput> = ["a", "b", "c"]
            .iter()
            .map(|id| {
                LineItemInput::Product(ProductInput {
                    product_id: id.to_string(),
                    quantity: Decimal::ONE,
                    override_price: None,
                })
            })
            .collect();
        inputs.push(LineItemInput::Transport(TransportInput {
            zone_id: "north".to_string(),
            trips: Decimal::ONE,
            override_price: None,
            allocation: None,
        }));
        inputs
    }

    #[test]
    fn test_per_line_mode_reconciles_exactly() {
        let config = PricingConfig {
            margin_mode: MarginMode::PerLine,
            margin_percentage: 17.5,
            retention_enabled: true,
            retention_percentage: 2.5,
        };
        let quote = compute_quote(&inputs(), &catalog(), &config, &QuoteOptions::default()).unwrap();

        assert!(quote.summary.is_consistent());
        assert_eq!(quote.breakdown.reconciled_total(), quote.summary.total);
        assert_eq!(
            quote.breakdown.lines.iter().map(|l| l.margin).sum::<Money>(),
            quote.summary.margin_amount
        );
        assert!(quote.trusted_breakdown().is_some());
    }

    #[test]
    fn test_clamped_margin_is_reported_not_fatal() {
        let config = PricingConfig {
            margin_percentage: -5.0,
            ..PricingConfig::default()
        };
        let quote = compute_quote(&inputs(), &catalog(), &config, &QuoteOptions::default()).unwrap();

        assert!(quote.summary.margin_amount.is_zero());
        assert!(matches!(quote.warnings[0], QuoteWarning::PercentageClamped { .. }));
    }

    #[test]
    fn test_invalid_percentage_rejects_pass() {
        let config = PricingConfig {
            margin_percentage: f64::NAN,
            ..PricingConfig::default()
        };
        let result = compute_quote(&inputs(), &catalog(), &config, &QuoteOptions::default());
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn test_not_distributable_still_returns_summary() {
        let inputs = vec![LineItemInput::Transport(TransportInput {
            zone_id: "north".to_string(),
            trips: Decimal::from(2),
            override_price: None,
            allocation: None,
        })];
        let config = PricingConfig {
            margin_percentage: 10.0,
            ..PricingConfig::default()
        };
        let quote = compute_quote(&inputs, &catalog(), &config, &QuoteOptions::default()).unwrap();

        assert_eq!(quote.summary.total.minor(), 2_200);
        assert!(quote.reconciliation.is_ok());
        assert!(quote.trusted_breakdown().is_none());
        assert!(quote
            .warnings
            .iter()
            .any(|w| matches!(w, QuoteWarning::NotDistributable { .. })));
    }

    #[test]
    fn test_compute_priced_matches_compute_quote() {
        let config = PricingConfig {
            margin_mode: MarginMode::PerLine,
            margin_percentage: 12.0,
            ..PricingConfig::default()
        };
        let priced = price_items(&inputs(), &catalog()).unwrap();

        assert_eq!(
            compute_priced(&priced, &config, &QuoteOptions::default()).unwrap(),
            compute_quote(&inputs(), &catalog(), &config, &QuoteOptions::default()).unwrap()
        );
    }
}
