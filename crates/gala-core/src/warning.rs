//! # Quote Warnings
//!
//! Non-fatal findings collected during a computation pass. A warning never
//! blocks the authoritative [`CostSummary`](crate::summary::CostSummary); it
//! tells the export layer what to flag and tells data-quality review what to
//! clean up.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::line_item::Category;
use crate::money::Money;

/// A non-fatal finding attached to a quote computation or rehydration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuoteWarning {
    /// A negative percentage was configured and treated as zero.
    PercentageClamped { field: String, configured: f64 },

    /// Retention was enabled with a zero or negative percentage.
    RetentionDisabled { configured: f64 },

    /// A consumable was requested below its catalog minimum.
    MinimumQuantityApplied {
        item_index: usize,
        #[ts(type = "string")]
        requested: Decimal,
        #[ts(type = "string")]
        applied: Decimal,
    },

    /// An allocation hint or labor link names a product with no line.
    UnknownAllocationTarget { item_index: usize, product_id: String },

    /// Ancillary cost exists but there are no product lines to carry it.
    NotDistributable { amount: Money },

    /// The itemized breakdown does not add up to the authoritative total.
    ReconciliationMismatch { delta: Money, tolerance: Money },

    /// A persisted item's reason string matched no category.
    UnclassifiedReason { item_id: String, reason: String },

    /// A persisted item's catalog entry is gone and was rebuilt from the record.
    SynthesizedCatalogEntry { category: Category, id: String },

    /// A persisted product line reused an id another product line already
    /// holds, so it was loaded under a fresh id.
    ProductIdReassigned { item_id: String, assigned_id: String },

    /// A legacy item's recomputed cost differed from its saved total, so the
    /// saved total was pinned as an override.
    SavedTotalPinned {
        item_id: String,
        recomputed: Money,
        saved: Money,
    },
}

impl fmt::Display for QuoteWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteWarning::PercentageClamped { field, configured } => {
                write!(f, "{} was {}, treated as 0", field, configured)
            }
            QuoteWarning::RetentionDisabled { configured } => {
                write!(f, "retention enabled with {}%, disabled", configured)
            }
            QuoteWarning::MinimumQuantityApplied {
                item_index,
                requested,
                applied,
            } => write!(
                f,
                "item {}: requested {} raised to catalog minimum {}",
                item_index, requested, applied
            ),
            QuoteWarning::UnknownAllocationTarget {
                item_index,
                product_id,
            } => write!(
                f,
                "item {}: allocation target {} has no product line",
                item_index, product_id
            ),
            QuoteWarning::NotDistributable { amount } => {
                write!(f, "{} of ancillary cost has no product line to carry it", amount)
            }
            QuoteWarning::ReconciliationMismatch { delta, tolerance } => write!(
                f,
                "breakdown differs from total by {} (tolerance {})",
                delta, tolerance
            ),
            QuoteWarning::UnclassifiedReason { item_id, reason } => {
                write!(f, "item {}: unrecognized reason '{}'", item_id, reason)
            }
            QuoteWarning::SynthesizedCatalogEntry { category, id } => {
                write!(f, "{} {} rebuilt from saved record", category, id)
            }
            QuoteWarning::ProductIdReassigned {
                item_id,
                assigned_id,
            } => write!(
                f,
                "item {}: product id already in use, loaded as {}",
                item_id, assigned_id
            ),
            QuoteWarning::SavedTotalPinned {
                item_id,
                recomputed,
                saved,
            } => write!(
                f,
                "item {}: recomputed {} but saved {}, keeping saved total",
                item_id, recomputed, saved
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_serializes_with_kind_tag() {
        let warning = QuoteWarning::NotDistributable {
            amount: Money::from_minor(100_000),
        };
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json["kind"], "not_distributable");
        assert_eq!(json["amount"], 100_000);
    }

    #[test]
    fn test_warning_display() {
        let warning = QuoteWarning::UnclassifiedReason {
            item_id: "x-1".to_string(),
            reason: "misc".to_string(),
        };
        assert_eq!(warning.to_string(), "item x-1: unrecognized reason 'misc'");

        let warning = QuoteWarning::ProductIdReassigned {
            item_id: "cake".to_string(),
            assigned_id: "cake#1".to_string(),
        };
        assert_eq!(warning.to_string(), "item cake: product id already in use, loaded as cake#1");
    }
}
