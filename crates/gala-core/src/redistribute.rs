//! # Line-Item Redistributor
//!
//! Reshapes where already-counted costs appear among product lines for the
//! itemized document. It never adds money: every priced item lands exactly
//! once, either split over product lines or as an unattributed row.
//!
//! ## Precedence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  For each non-product item, first rule that yields targets wins:        │
//! │                                                                         │
//! │  1. QuantityTable     hint with per-product quantities → proportional   │
//! │  2. ManualSelection   hint naming one or more products → even           │
//! │  3. LaborAssociation  labor: its linked products (by hours if declared) │
//! │                       ancillary: products linked by any labor → even    │
//! │  4. EvenAcrossAll     ancillary only → every product line, even         │
//! │                                                                         │
//! │  No rule applies ──► UnattributedCost (Standalone)                      │
//! │  No product lines ─► UnattributedCost (NotDistributable)                │
//! │                                                                         │
//! │  Ancillary = Transport, Consumable, RentedEquipment                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Hint targets that name no product line are reported and skipped; if none
//! remain, the next rule is tried.
//!
//! ## Breakdown Identity
//! ```text
//! Σ lines.final_cost + Σ unattributed.final_cost + summary_margin − retention
//!     == CostSummary.total
//! ```

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::aggregate::PricedItem;
use crate::line_item::{AllocationHint, Category};
use crate::margin::MarginOutcome;
use crate::money::Money;
use crate::pricing::MarginMode;
use crate::warning::QuoteWarning;

// =============================================================================
// Breakdown Types
// =============================================================================

/// The rule that placed an item's cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AllocationRule {
    QuantityTable,
    ManualSelection,
    LaborAssociation,
    EvenAcrossAll,
}

impl AllocationRule {
    /// Rules in the order they are tried.
    pub const PRECEDENCE: [AllocationRule; 4] = [
        AllocationRule::QuantityTable,
        AllocationRule::ManualSelection,
        AllocationRule::LaborAssociation,
        AllocationRule::EvenAcrossAll,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStatus {
    #[default]
    Distributed,
    /// Ancillary cost exists but there is no product line to carry it.
    NotDistributable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UnattributedReason {
    /// Belongs to no product (unlinked labor, owned equipment, subcontracts).
    Standalone,
    /// Would be distributed, but there are no product lines.
    NotDistributable,
}

/// A product with the ancillary cost it absorbed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductLine {
    pub item_index: usize,
    pub product_id: String,
    pub name: String,
    #[ts(type = "string")]
    pub quantity: Decimal,
    pub unit_cost: Money,
    pub base_cost: Money,
    pub transport: Money,
    pub consumables: Money,
    pub rentals: Money,
    pub labor: Money,
    /// Owned equipment and subcontracts placed by a hint.
    pub other: Money,
    pub margin: Money,
    pub final_cost: Money,
}

impl ProductLine {
    fn from_item(item: &PricedItem) -> Self {
        ProductLine {
            item_index: item.index,
            product_id: item.catalog_id.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            unit_cost: item.unit_price,
            base_cost: item.cost,
            transport: Money::zero(),
            consumables: Money::zero(),
            rentals: Money::zero(),
            labor: Money::zero(),
            other: Money::zero(),
            margin: Money::zero(),
            final_cost: item.cost,
        }
    }

    pub fn ancillary_cost(&self) -> Money {
        self.transport + self.consumables + self.rentals + self.labor + self.other
    }

    /// Cost after redistribution, before margin.
    pub fn pricing_base(&self) -> Money {
        self.base_cost + self.ancillary_cost()
    }

    fn absorb(&mut self, category: Category, share: Money) {
        let bucket = match category {
            Category::Transport => &mut self.transport,
            Category::Consumable => &mut self.consumables,
            Category::RentedEquipment => &mut self.rentals,
            Category::Labor => &mut self.labor,
            Category::OwnedEquipment | Category::Subcontract => &mut self.other,
            Category::Product => &mut self.base_cost,
        };
        *bucket += share;
        self.final_cost = self.pricing_base() + self.margin;
    }

    fn set_margin(&mut self, margin: Money) {
        self.margin = margin;
        self.final_cost = self.pricing_base() + margin;
    }
}

/// A cost kept outside the product lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UnattributedCost {
    pub item_index: usize,
    pub category: Category,
    pub catalog_id: String,
    pub name: String,
    pub cost: Money,
    pub reason: UnattributedReason,
    pub margin: Money,
    pub final_cost: Money,
}

impl UnattributedCost {
    fn from_item(item: &PricedItem, reason: UnattributedReason) -> Self {
        UnattributedCost {
            item_index: item.index,
            category: item.category,
            catalog_id: item.catalog_id.clone(),
            name: item.name.clone(),
            cost: item.cost,
            reason,
            margin: Money::zero(),
            final_cost: item.cost,
        }
    }

    fn set_margin(&mut self, margin: Money) {
        self.margin = margin;
        self.final_cost = self.cost + margin;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AllocationShare {
    pub product_id: String,
    pub amount: Money,
}

/// Audit trail: which rule placed an item and where its cost went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRecord {
    pub item_index: usize,
    pub category: Category,
    pub rule: AllocationRule,
    pub shares: Vec<AllocationShare>,
}

/// The itemized view of a quote, for display and export only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub status: DistributionStatus,
    pub lines: Vec<ProductLine>,
    pub unattributed: Vec<UnattributedCost>,
    /// Global-mode margin, shown as its own row.
    pub summary_margin: Money,
    pub retention: Money,
    pub allocations: Vec<AllocationRecord>,
}

impl CostBreakdown {
    pub fn is_distributable(&self) -> bool {
        self.status == DistributionStatus::Distributed
    }

    /// Number of priced rows (product lines plus unattributed rows).
    pub fn row_count(&self) -> usize {
        self.lines.len() + self.unattributed.len()
    }

    /// Pre-margin cost of every row: product lines first, then
    /// unattributed rows. These are the per-line margin bases.
    pub fn pricing_bases(&self) -> Vec<Money> {
        self.lines
            .iter()
            .map(ProductLine::pricing_base)
            .chain(self.unattributed.iter().map(|row| row.cost))
            .collect()
    }

    pub fn lines_total(&self) -> Money {
        self.lines.iter().map(|line| line.final_cost).sum()
    }

    /// What the breakdown adds up to.
    pub fn reconciled_total(&self) -> Money {
        let unattributed: Money = self.unattributed.iter().map(|row| row.final_cost).sum();
        self.lines_total() + unattributed + self.summary_margin - self.retention
    }

    /// Writes margin and retention onto the rows.
    ///
    /// Per-line margins are used only when there is one per row; otherwise
    /// the whole margin is shown as the summary row.
    pub fn apply_margin(&mut self, outcome: &MarginOutcome, mode: MarginMode) {
        let per_line =
            mode == MarginMode::PerLine && outcome.per_line_margins.len() == self.row_count();

        if per_line {
            let (line_margins, row_margins) = outcome.per_line_margins.split_at(self.lines.len());
            for (line, margin) in self.lines.iter_mut().zip(line_margins) {
                line.set_margin(*margin);
            }
            for (row, margin) in self.unattributed.iter_mut().zip(row_margins) {
                row.set_margin(*margin);
            }
            self.summary_margin = Money::zero();
        } else {
            self.lines.iter_mut().for_each(|line| line.set_margin(Money::zero()));
            self.unattributed.iter_mut().for_each(|row| row.set_margin(Money::zero()));
            self.summary_margin = outcome.margin_amount;
        }

        self.retention = outcome.retention_amount;
    }
}

/// Breakdown plus the warnings raised while building it.
#[derive(Debug, Clone, PartialEq)]
pub struct Redistribution {
    pub breakdown: CostBreakdown,
    pub warnings: Vec<QuoteWarning>,
}

// =============================================================================
// Policy Table
// =============================================================================

/// Line positions with their weights.
type Targets = Vec<(usize, Decimal)>;

type RuleFn = fn(&PricedItem, &LineIndex<'_>, &mut Vec<QuoteWarning>) -> Option<Targets>;

const POLICY: &[(AllocationRule, RuleFn)] = &[
    (AllocationRule::QuantityTable, by_quantity_table),
    (AllocationRule::ManualSelection, by_manual_selection),
    (AllocationRule::LaborAssociation, by_labor_association),
    (AllocationRule::EvenAcrossAll, across_all_lines),
];

struct LineIndex<'a> {
    positions: HashMap<&'a str, usize>,
    len: usize,
    /// Lines linked to by any labor input, in line order.
    labor_linked: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn build(items: &'a [PricedItem]) -> Self {
        let positions: HashMap<&str, usize> = items
            .iter()
            .filter(|item| item.category == Category::Product)
            .enumerate()
            .map(|(position, item)| (item.catalog_id.as_str(), position))
            .collect();

        let mut labor_linked: Vec<usize> = items
            .iter()
            .flat_map(|item| item.labor_links.iter())
            .filter_map(|link| positions.get(link.product_id.as_str()).copied())
            .collect();
        labor_linked.sort_unstable();
        labor_linked.dedup();

        LineIndex {
            len: positions.len(),
            positions,
            labor_linked,
        }
    }

    fn resolve(&self, item_index: usize, product_id: &str, warnings: &mut Vec<QuoteWarning>) -> Option<usize> {
        let position = self.positions.get(product_id).copied();
        if position.is_none() {
            warn!(item_index, product_id = %product_id, "Allocation target has no product line");
            warnings.push(QuoteWarning::UnknownAllocationTarget {
                item_index,
                product_id: product_id.to_string(),
            });
        }
        position
    }
}

fn by_quantity_table(item: &PricedItem, lines: &LineIndex<'_>, warnings: &mut Vec<QuoteWarning>) -> Option<Targets> {
    let Some(AllocationHint::QuantityTable { entries }) = &item.allocation else {
        return None;
    };

    let targets = entries
        .iter()
        .filter_map(|entry| {
            lines
                .resolve(item.index, &entry.product_id, warnings)
                .map(|position| (position, entry.quantity))
        })
        .collect();
    weighted(merge(targets))
}

fn by_manual_selection(item: &PricedItem, lines: &LineIndex<'_>, warnings: &mut Vec<QuoteWarning>) -> Option<Targets> {
    let ids: Vec<&str> = match &item.allocation {
        Some(AllocationHint::Product { product_id }) => vec![product_id.as_str()],
        Some(AllocationHint::Selection { product_ids }) => product_ids.iter().map(String::as_str).collect(),
        _ => return None,
    };

    let positions = ids
        .into_iter()
        .filter_map(|id| lines.resolve(item.index, id, warnings))
        .collect();
    weighted(even(positions))
}

fn by_labor_association(item: &PricedItem, lines: &LineIndex<'_>, warnings: &mut Vec<QuoteWarning>) -> Option<Targets> {
    match item.category {
        Category::Labor => {
            let linked: Vec<(usize, Option<Decimal>)> = item
                .labor_links
                .iter()
                .filter_map(|link| {
                    lines
                        .resolve(item.index, &link.product_id, warnings)
                        .map(|position| (position, link.hours))
                })
                .collect();

            let by_hours = !linked.is_empty()
                && linked
                    .iter()
                    .all(|(_, hours)| hours.is_some_and(|h| h > Decimal::ZERO));

            if by_hours {
                weighted(merge(
                    linked
                        .into_iter()
                        .filter_map(|(position, hours)| hours.map(|h| (position, h)))
                        .collect(),
                ))
            } else {
                weighted(even(linked.into_iter().map(|(position, _)| position).collect()))
            }
        }
        category if category.is_ancillary() => {
            weighted(even(lines.labor_linked.clone()))
        }
        _ => None,
    }
}

fn across_all_lines(item: &PricedItem, lines: &LineIndex<'_>, _: &mut Vec<QuoteWarning>) -> Option<Targets> {
    if !item.category.is_ancillary() {
        return None;
    }
    weighted(even((0..lines.len).collect()))
}

/// Sums the weights of repeated positions, keeping first-seen order.
fn merge(targets: Targets) -> Targets {
    let mut merged: Targets = Vec::with_capacity(targets.len());
    for (position, weight) in targets {
        match merged.iter_mut().find(|(p, _)| *p == position) {
            Some((_, total)) => *total += weight,
            None => merged.push((position, weight)),
        }
    }
    merged
}

/// Equal weight for each distinct position.
fn even(positions: Vec<usize>) -> Targets {
    let mut targets: Targets = Vec::with_capacity(positions.len());
    for position in positions {
        if !targets.iter().any(|(p, _)| *p == position) {
            targets.push((position, Decimal::ONE));
        }
    }
    targets
}

fn weighted(targets: Targets) -> Option<Targets> {
    let total: Decimal = targets.iter().map(|(_, weight)| *weight).sum();
    (total > Decimal::ZERO).then_some(targets)
}

// =============================================================================
// Redistribution
// =============================================================================

/// Builds the per-product-line breakdown from priced items.
///
/// Margin and retention are zero until [`CostBreakdown::apply_margin`].
pub fn redistribute(items: &[PricedItem]) -> Redistribution {
    let index = LineIndex::build(items);
    let mut warnings = Vec::new();

    let mut breakdown = CostBreakdown {
        lines: items
            .iter()
            .filter(|item| item.category == Category::Product)
            .map(ProductLine::from_item)
            .collect(),
        ..CostBreakdown::default()
    };

    let mut undistributable = Money::zero();

    for item in items.iter().filter(|item| item.category != Category::Product) {
        if breakdown.lines.is_empty() {
            let reason = if wants_distribution(item) {
                undistributable += item.cost;
                UnattributedReason::NotDistributable
            } else {
                UnattributedReason::Standalone
            };
            breakdown.unattributed.push(UnattributedCost::from_item(item, reason));
            continue;
        }

        match place(item, &index, &mut warnings) {
            Some((rule, shares)) => {
                let mut record = AllocationRecord {
                    item_index: item.index,
                    category: item.category,
                    rule,
                    shares: Vec::with_capacity(shares.len()),
                };
                for (position, amount) in shares {
                    let line = &mut breakdown.lines[position];
                    line.absorb(item.category, amount);
                    record.shares.push(AllocationShare {
                        product_id: line.product_id.clone(),
                        amount,
                    });
                }
                debug!(item_index = item.index, rule = ?rule, "Cost allocated to product lines");
                breakdown.allocations.push(record);
            }
            None => breakdown
                .unattributed
                .push(UnattributedCost::from_item(item, UnattributedReason::Standalone)),
        }
    }

    if !undistributable.is_zero() {
        warn!(amount = %undistributable, "No product lines to carry ancillary cost");
        breakdown.status = DistributionStatus::NotDistributable;
        warnings.push(QuoteWarning::NotDistributable {
            amount: undistributable,
        });
    }

    Redistribution {
        breakdown,
        warnings,
    }
}

/// Runs the policy table and splits the cost with the first rule that fits.
fn place(
    item: &PricedItem,
    index: &LineIndex<'_>,
    warnings: &mut Vec<QuoteWarning>,
) -> Option<(AllocationRule, Vec<(usize, Money)>)> {
    for (rule, apply) in POLICY {
        let Some(targets) = apply(item, index, warnings) else {
            continue;
        };
        let weights: Vec<Decimal> = targets.iter().map(|(_, weight)| *weight).collect();
        if let Some(shares) = item.cost.allocate(&weights) {
            let positions = targets.into_iter().map(|(position, _)| position);
            return Some((*rule, positions.zip(shares).collect()));
        }
    }
    None
}

fn wants_distribution(item: &PricedItem) -> bool {
    item.category.is_ancillary() || item.allocation.is_some() || !item.labor_links.is_empty()
}

// =============================================================================
// Unit Tests
// =============================================================================
