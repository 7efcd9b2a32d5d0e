//! # Cost Aggregator
//!
//! Converts typed line-item inputs into priced items, category subtotals and
//! a grand subtotal.
//!
//! ## Pricing Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Category          Item cost                                            │
//! │  ───────────────   ──────────────────────────────────────────────────── │
//! │  Labor             day cost × days                                      │
//! │  Product           unit price × quantity                                │
//! │  OwnedEquipment    day cost × days × units                              │
//! │                    + operator day cost × days   (if toggled & offered)  │
//! │                    + setup + delivery + pickup  (each if toggled)       │
//! │  RentedEquipment   charged day cost × days × units + one-time charges   │
//! │                    (hours raised to the rental minimum)                 │
//! │  Subcontract       charged price × quantity                             │
//! │  Consumable        unit price × max(requested, minimum)                 │
//! │  Transport         cost per trip × trips                                │
//! │                                                                         │
//! │  day cost = daily rate if hours ≥ 8 and one exists, else hourly × hours │
//! │  Unit override → replaces the billing-unit rate                        │
//! │  Total override → replaces the whole item cost (wins over everything)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any malformed input rejects the whole call. There is no partial summary.

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::catalog::{CatalogLookup, OneTimeCharges, RateCard};
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::line_item::{
    AddOns, AllocationHint, Category, LaborLink, LineItemInput, PriceOverride, WorkPeriod,
};
use crate::money::Money;
use crate::pricing::PricingPolicy;
use crate::summary::{CategoryCosts, CostSummary};
use crate::warning::QuoteWarning;

// =============================================================================
// Priced Item
// =============================================================================

/// The result of pricing one input.
///
/// `quantity` and `unit_price` are in the item's billing unit: days for
/// labor, units for equipment, trips for transport, the applied quantity
/// for consumables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricedItem {
    /// Position of the input in the quote.
    pub index: usize,
    pub category: Category,
    pub catalog_id: String,
    pub name: String,
    #[ts(type = "string")]
    pub quantity: Decimal,
    pub unit_price: Money,
    pub cost: Money,
    /// What the business pays its supplier (rentals and subcontracts).
    pub supplier_cost: Option<Money>,
    /// Supplier rate per billing unit: per day for rentals, per unit for
    /// subcontracts.
    pub supplier_unit_price: Option<Money>,
    pub allocation: Option<AllocationHint>,
    pub labor_links: Vec<LaborLink>,
}

impl PricedItem {
    /// Markup already inside the charged price.
    pub fn embedded_margin(&self) -> Money {
        self.supplier_cost
            .map(|supplier| self.cost - supplier)
            .unwrap_or_default()
    }
}

/// All priced items of a quote with the margin-free summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricedQuote {
    pub items: Vec<PricedItem>,
    pub summary: CostSummary,
    pub warnings: Vec<QuoteWarning>,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Aggregates inputs into a [`CostSummary`].
///
/// Margin and retention amounts are left at zero; only the margin mode is
/// stamped from `policy`. See [`crate::margin::apply_margin_and_retention`].
pub fn aggregate<C: CatalogLookup + ?Sized>(
    inputs: &[LineItemInput],
    catalog: &C,
    policy: &PricingPolicy,
) -> CoreResult<CostSummary> {
    let mut priced = price_items(inputs, catalog)?;
    priced.summary.margin_mode = policy.margin_mode;
    Ok(priced.summary)
}

/// Prices every input and sums them per category.
///
/// ## Errors
/// - [`ValidationError`] for negative quantities, missing ids, zero days,
///   duplicate product lines or amounts too large to represent
/// - [`CoreError::CatalogEntryNotFound`] for unknown catalog ids
pub fn price_items<C: CatalogLookup + ?Sized>(
    inputs: &[LineItemInput],
    catalog: &C,
) -> CoreResult<PricedQuote> {
    let mut seen_products = HashSet::new();
    for input in inputs {
        input.validate()?;
        if let LineItemInput::Product(product) = input {
            if !seen_products.insert(product.product_id.as_str()) {
                return Err(ValidationError::Duplicate {
                    field: "product_id".to_string(),
                    value: product.product_id.clone(),
                }
                .into());
            }
        }
    }

    let mut items = Vec::with_capacity(inputs.len());
    let mut warnings = Vec::new();
    let mut category_costs = CategoryCosts::default();
    let mut embedded_margin = Money::zero();

    for (index, input) in inputs.iter().enumerate() {
        let item = price_item(index, input, catalog, &mut warnings)?;

        category_costs
            .checked_add(item.category, item.cost)
            .ok_or_else(|| too_large("subtotal"))?;
        embedded_margin = embedded_margin
            .checked_add(item.embedded_margin())
            .ok_or_else(|| too_large("embedded_margin"))?;

        items.push(item);
    }

    let summary = CostSummary::from_category_costs(category_costs, embedded_margin, Default::default());

    debug!(
        items = items.len(),
        subtotal = %summary.subtotal,
        "Aggregated line items"
    );

    Ok(PricedQuote {
        items,
        summary,
        warnings,
    })
}

/// Prices a single input. The input must already be validated.
pub(crate) fn price_item<C: CatalogLookup + ?Sized>(
    index: usize,
    input: &LineItemInput,
    catalog: &C,
    warnings: &mut Vec<QuoteWarning>,
) -> CoreResult<PricedItem> {
    let category = input.category();
    let catalog_id = input.catalog_id();
    let unit_override = PriceOverride::unit_price(input.override_price());

    let not_found = || CoreError::CatalogEntryNotFound {
        category,
        id: catalog_id.to_string(),
    };

    let priced = match input {
        LineItemInput::Labor(labor) => {
            let entry = catalog.labor(catalog_id).ok_or_else(not_found)?;
            let day = match unit_override {
                Some(price) => price,
                None => day_cost(&entry.rate_card, labor.period.hours)?,
            };
            let days = Decimal::from(labor.period.days);
            Costed::new(&entry.name, days, day, mul(day, days)?)
        }

        LineItemInput::Product(product) => {
            let entry = catalog.product(catalog_id).ok_or_else(not_found)?;
            let unit = unit_override.unwrap_or(entry.unit_price);
            Costed::new(&entry.name, product.quantity, unit, mul(unit, product.quantity)?)
        }

        LineItemInput::OwnedEquipment(equipment) => {
            let entry = catalog.equipment(catalog_id).ok_or_else(not_found)?;
            let day = match unit_override {
                Some(price) => price,
                None => day_cost(&entry.rate_card, equipment.period.hours)?,
            };
            let mut cost = booked(day, equipment.period, equipment.units)?;

            if equipment.add_ons.operator {
                match &entry.operator {
                    Some(card) => {
                        let operator_day = day_cost(card, equipment.period.hours)?;
                        cost = add(cost, mul(operator_day, Decimal::from(equipment.period.days))?)?;
                    }
                    None => debug!(equipment_id = %catalog_id, "Operator requested but not offered"),
                }
            }
            cost = add(cost, one_time_charges(&entry.charges, &equipment.add_ons)?)?;

            Costed::new(&entry.name, equipment.units, day, cost)
        }

        LineItemInput::RentedEquipment(rental) => {
            let entry = catalog.rental(catalog_id).ok_or_else(not_found)?;
            let billed_hours = rental.period.hours.max(entry.min_rental_hours);
            let period = WorkPeriod::new(billed_hours, rental.period.days);

            let day = match unit_override {
                Some(price) => price,
                None => day_cost(&entry.charged, billed_hours)?,
            };
            let charges = one_time_charges(&entry.charges, &rental.add_ons)?;
            let cost = add(booked(day, period, rental.units)?, charges)?;

            let supplier_day = day_cost(&entry.supplier, billed_hours)?;
            let supplier_cost = add(booked(supplier_day, period, rental.units)?, charges)?;

            let mut costed = Costed::new(&entry.name, rental.units, day, cost);
            costed.supplier_cost = Some(supplier_cost);
            costed.supplier_unit_price = Some(supplier_day);
            costed
        }

        LineItemInput::Subcontract(subcontract) => {
            let entry = catalog.subcontract(catalog_id).ok_or_else(not_found)?;
            let unit = unit_override.unwrap_or(entry.charged_price);
            let mut costed = Costed::new(
                &entry.name,
                subcontract.quantity,
                unit,
                mul(unit, subcontract.quantity)?,
            );
            costed.supplier_cost = Some(mul(entry.supplier_cost, subcontract.quantity)?);
            costed.supplier_unit_price = Some(entry.supplier_cost);
            costed
        }

        LineItemInput::Consumable(consumable) => {
            let entry = catalog.consumable(catalog_id).ok_or_else(not_found)?;
            let applied = consumable.quantity.max(entry.minimum_quantity);
            if applied > consumable.quantity {
                warn!(
                    consumable_id = %catalog_id,
                    requested = %consumable.quantity,
                    minimum = %entry.minimum_quantity,
                    "Consumable quantity raised to catalog minimum"
                );
                warnings.push(QuoteWarning::MinimumQuantityApplied {
                    item_index: index,
                    requested: consumable.quantity,
                    applied,
                });
            }
            let unit = unit_override.unwrap_or(entry.unit_price);
            Costed::new(&entry.name, applied, unit, mul(unit, applied)?)
        }

        LineItemInput::Transport(transport) => {
            let entry = catalog.transport_zone(catalog_id).ok_or_else(not_found)?;
            let unit = unit_override.unwrap_or(entry.cost_per_trip);
            Costed::new(&entry.name, transport.trips, unit, mul(unit, transport.trips)?)
        }
    };

    let cost = PriceOverride::total_price(input.override_price()).unwrap_or(priced.cost);

    Ok(PricedItem {
        index,
        category,
        catalog_id: catalog_id.to_string(),
        name: priced.name,
        quantity: priced.quantity,
        unit_price: priced.unit_price,
        cost,
        supplier_cost: priced.supplier_cost,
        supplier_unit_price: priced.supplier_unit_price,
        allocation: input.allocation().cloned(),
        labor_links: input.labor_links().to_vec(),
    })
}

// =============================================================================
// Helpers
// =============================================================================

struct Costed {
    name: String,
    quantity: Decimal,
    unit_price: Money,
    cost: Money,
    supplier_cost: Option<Money>,
    supplier_unit_price: Option<Money>,
}

impl Costed {
    fn new(name: &str, quantity: Decimal, unit_price: Money, cost: Money) -> Self {
        Costed {
            name: name.to_string(),
            quantity,
            unit_price,
            cost,
            supplier_cost: None,
            supplier_unit_price: None,
        }
    }
}

fn too_large(field: &str) -> CoreError {
    ValidationError::TooLarge {
        field: field.to_string(),
    }
    .into()
}

fn mul(amount: Money, quantity: Decimal) -> CoreResult<Money> {
    amount
        .checked_mul_quantity(quantity)
        .ok_or_else(|| too_large("cost"))
}

fn add(a: Money, b: Money) -> CoreResult<Money> {
    a.checked_add(b).ok_or_else(|| too_large("cost"))
}

fn day_cost(card: &RateCard, hours: Decimal) -> CoreResult<Money> {
    card.day_cost(hours).ok_or_else(|| too_large("hours"))
}

/// `day × days × units`
fn booked(day: Money, period: WorkPeriod, units: Decimal) -> CoreResult<Money> {
    mul(mul(day, Decimal::from(period.days))?, units)
}

fn one_time_charges(charges: &OneTimeCharges, add_ons: &AddOns) -> CoreResult<Money> {
    let toggled = [
        (add_ons.setup, charges.setup),
        (add_ons.delivery, charges.delivery),
        (add_ons.pickup, charges.pickup),
    ];

    toggled
        .into_iter()
        .filter_map(|(on, charge)| if on { charge } else { None })
        .try_fold(Money::zero(), add)
}

// =============================================================================
// Unit Tests
// =============================================================================
