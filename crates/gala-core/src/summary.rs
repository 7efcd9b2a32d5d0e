//! # Cost Summary
//!
//! The authoritative aggregate of a quote. Every monetary figure of record
//! comes from here; the per-line breakdown only reshapes it.
//!
//! ## Identity
//! ```text
//! subtotal = Σ category costs
//! total    = subtotal + margin_amount − retention_amount
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::line_item::Category;
use crate::margin::MarginOutcome;
use crate::money::Money;
use crate::pricing::{MarginMode, PricingPolicy};

// =============================================================================
// Category Costs
// =============================================================================

/// One amount per cost category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCosts {
    pub labor: Money,
    pub products: Money,
    pub owned_equipment: Money,
    pub rented_equipment: Money,
    pub subcontracts: Money,
    pub consumables: Money,
    pub transport: Money,
}

impl CategoryCosts {
    pub fn get(&self, category: Category) -> Money {
        match category {
            Category::Labor => self.labor,
            Category::Product => self.products,
            Category::OwnedEquipment => self.owned_equipment,
            Category::RentedEquipment => self.rented_equipment,
            Category::Subcontract => self.subcontracts,
            Category::Consumable => self.consumables,
            Category::Transport => self.transport,
        }
    }

    fn slot(&mut self, category: Category) -> &mut Money {
        match category {
            Category::Labor => &mut self.labor,
            Category::Product => &mut self.products,
            Category::OwnedEquipment => &mut self.owned_equipment,
            Category::RentedEquipment => &mut self.rented_equipment,
            Category::Subcontract => &mut self.subcontracts,
            Category::Consumable => &mut self.consumables,
            Category::Transport => &mut self.transport,
        }
    }

    /// Adds `amount` to a category. Returns `None` on overflow.
    pub fn checked_add(&mut self, category: Category, amount: Money) -> Option<()> {
        let slot = self.slot(category);
        *slot = slot.checked_add(amount)?;
        Some(())
    }

    pub fn total(&self) -> Money {
        self.iter().map(|(_, amount)| amount).sum()
    }

    /// Category amounts in [`Category::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, Money)> + '_ {
        Category::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

// =============================================================================
// Cost Summary
// =============================================================================

/// The authoritative financial summary of a quote.
///
/// `embedded_margin` is the markup already contained in rented equipment and
/// subcontract prices (charged minus supplier cost). It is informational and
/// never added to `total`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CostSummary {
    pub category_costs: CategoryCosts,
    pub subtotal: Money,
    pub margin_mode: MarginMode,
    pub margin_percentage: f64,
    pub margin_amount: Money,
    pub retention_percentage: f64,
    pub retention_amount: Money,
    pub total: Money,
    pub embedded_margin: Money,
}

impl CostSummary {
    /// A summary with margin and retention still at zero.
    pub fn from_category_costs(
        category_costs: CategoryCosts,
        embedded_margin: Money,
        margin_mode: MarginMode,
    ) -> Self {
        let subtotal = category_costs.total();
        CostSummary {
            category_costs,
            subtotal,
            margin_mode,
            margin_percentage: 0.0,
            margin_amount: Money::zero(),
            retention_percentage: 0.0,
            retention_amount: Money::zero(),
            total: subtotal,
            embedded_margin,
        }
    }

    /// Fills in the margin and retention figures.
    pub fn with_margin(mut self, outcome: &MarginOutcome, policy: &PricingPolicy) -> Self {
        self.margin_mode = policy.margin_mode;
        self.margin_percentage = policy.margin_rate.percentage();
        self.margin_amount = outcome.margin_amount;
        self.retention_percentage = policy.retention_rate.percentage();
        self.retention_amount = outcome.retention_amount;
        self.total = outcome.total;
        self
    }

    /// `total == subtotal + margin_amount − retention_amount` and the
    /// subtotal matches its categories.
    pub fn is_consistent(&self) -> bool {
        self.subtotal == self.category_costs.total()
            && self.total == self.subtotal + self.margin_amount - self.retention_amount
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::Rate;

    fn costs() -> CategoryCosts {
        let mut costs = CategoryCosts::default();
        costs.checked_add(Category::Labor, Money::from_minor(1_000_000)).unwrap();
        costs.checked_add(Category::Product, Money::from_minor(500_000)).unwrap();
        costs.checked_add(Category::Transport, Money::from_minor(60_000)).unwrap();
        costs.checked_add(Category::Transport, Money::from_minor(40_000)).unwrap();
        costs
    }

    #[test]
    fn test_category_costs_total() {
        let costs = costs();
        assert_eq!(costs.get(Category::Transport).minor(), 100_000);
        assert_eq!(costs.total().minor(), 1_600_000);
        assert_eq!(costs.iter().count(), 7);
    }

    #[test]
    fn test_category_costs_overflow() {
        let mut costs = CategoryCosts::default();
        costs.checked_add(Category::Labor, Money::from_minor(i64::MAX)).unwrap();
        assert!(costs.checked_add(Category::Labor, Money::from_minor(1)).is_none());
    }

    #[test]
    fn test_summary_with_margin() {
        let summary = CostSummary::from_category_costs(costs(), Money::zero(), MarginMode::Global);
        assert!(summary.is_consistent());
        assert_eq!(summary.total, summary.subtotal);

        let policy = PricingPolicy::global(Rate::from_bps(3000));
        let outcome = MarginOutcome {
            margin_amount: Money::from_minor(480_000),
            retention_amount: Money::zero(),
            total: Money::from_minor(2_080_000),
            per_line_margins: Vec::new(),
        };
        let summary = summary.with_margin(&outcome, &policy);
        assert_eq!(summary.margin_percentage, 30.0);
        assert_eq!(summary.total.minor(), 2_080_000);
        assert!(summary.is_consistent());
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let summary = CostSummary::from_category_costs(costs(), Money::zero(), MarginMode::PerLine);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["categoryCosts"]["ownedEquipment"], 0);
        assert_eq!(json["marginMode"], "per_line");
        assert_eq!(json["subtotal"], 1_600_000);
    }
}
