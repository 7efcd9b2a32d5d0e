//! # Reconciliation Guard
//!
//! Checks that the itemized breakdown adds up to the authoritative total.
//! A mismatch is a warning-level result: the summary stays the figure of
//! record and the breakdown becomes advisory.
//!
//! ```text
//! ε     = tolerance_per_line × max(1, rows)
//! delta = breakdown.reconciled_total() − summary.total
//! |delta| ≤ ε  and  summary identity holds  ──► Ok
//! otherwise                                 ──► Mismatch { delta, ε }
//! ```

use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;

use crate::money::Money;
use crate::redistribute::CostBreakdown;
use crate::summary::CostSummary;
use crate::warning::QuoteWarning;

/// Outcome of [`verify`], attached to the export so inconsistent
/// breakdowns can be flagged or suppressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reconciliation {
    Ok,
    Mismatch { delta: Money, tolerance: Money },
}

impl Reconciliation {
    pub fn is_ok(&self) -> bool {
        matches!(self, Reconciliation::Ok)
    }

    pub fn to_warning(&self) -> Option<QuoteWarning> {
        match *self {
            Reconciliation::Ok => None,
            Reconciliation::Mismatch { delta, tolerance } => {
                Some(QuoteWarning::ReconciliationMismatch { delta, tolerance })
            }
        }
    }
}

/// Compares the breakdown with the summary.
///
/// A summary that breaks its own identity
/// (`total == subtotal + margin − retention`) is always a mismatch,
/// whatever the tolerance.
pub fn verify(breakdown: &CostBreakdown, summary: &CostSummary, tolerance_per_line: Money) -> Reconciliation {
    let rows = breakdown.row_count().max(1) as i64;
    let tolerance = tolerance_per_line.abs() * rows;

    let identity = summary.subtotal + summary.margin_amount - summary.retention_amount;
    if !summary.is_consistent() {
        let delta = identity - summary.total;
        warn!(delta = %delta, total = %summary.total, "Summary breaks its own identity");
        return Reconciliation::Mismatch {
            delta,
            tolerance: Money::zero(),
        };
    }

    let delta = breakdown.reconciled_total() - summary.total;
    if delta.abs() > tolerance {
        warn!(
            delta = %delta,
            tolerance = %tolerance,
            total = %summary.total,
            "Breakdown does not reconcile with summary"
        );
        return Reconciliation::Mismatch { delta, tolerance };
    }

    Reconciliation::Ok
}

// =============================================================================
// Unit Tests
// =============================================================================
