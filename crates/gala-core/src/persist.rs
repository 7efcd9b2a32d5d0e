//! # Persisted Quote Records
//!
//! The flat item format the persistence collaborator stores, and the emitter
//! that produces it from a priced quote.
//!
//! ## Record Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PersistedItem                                                          │
//! │  ├── id                    catalog id                                   │
//! │  ├── category              stable tag (absent on legacy records)        │
//! │  ├── reason                "Equipment rental - Tent" (legacy routing)   │
//! │  ├── quantity              billing units                                │
//! │  ├── unitPrice / totalPrice                                             │
//! │  ├── associatedProductId   single-product hint, if any                  │
//! │  ├── notes                 catalog display name                         │
//! │  └── detail                hours, days, units, add-ons, override,       │
//! │                            allocation, labor links, supplier cost       │
//! │                            (absent on legacy)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! With `category` and `detail` present, rehydration is exact. Records
//! without them go through the lossy reason-string path.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::aggregate::{PricedItem, PricedQuote};
use crate::line_item::{AddOns, AllocationHint, Category, LaborLink, LineItemInput, PriceOverride};
use crate::money::Money;
use crate::pricing::PricingConfig;
use crate::summary::CostSummary;
use crate::validation::{validate_id, validate_price, validate_quantity, validate_uuid, ValidationResult};

// =============================================================================
// Persisted Types
// =============================================================================

/// Structured input data that the flat columns cannot carry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub hours: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub days: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub units: Option<Decimal>,

    /// Consumable quantity before the catalog minimum was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub requested_quantity: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_ons: Option<AddOns>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_price: Option<PriceOverride>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation: Option<AllocationHint>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub linked_products: Vec<LaborLink>,

    /// Supplier rate per billing unit (rentals and subcontracts).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_unit_price: Option<Money>,

    /// Total supplier cost, one-time charges included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_cost: Option<Money>,
}

/// One flat line of a saved quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PersistedItem {
    pub id: String,

    #[serde(default)]
    pub category: Option<Category>,

    pub reason: String,

    #[ts(type = "string")]
    pub quantity: Decimal,

    pub unit_price: Money,

    pub total_price: Money,

    #[serde(default)]
    pub associated_product_id: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,

    #[serde(default)]
    pub detail: Option<ItemDetail>,
}

impl PersistedItem {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("id", &self.id)?;
        validate_quantity("quantity", self.quantity)?;
        validate_price("unit_price", self.unit_price)?;
        validate_price("total_price", self.total_price)
    }
}

/// A saved quote as stored by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PersistedQuote {
    /// UUID v4.
    pub id: String,

    #[ts(as = "String")]
    pub saved_at: DateTime<Utc>,

    #[serde(default)]
    pub pricing: PricingConfig,

    pub items: Vec<PersistedItem>,

    pub summary: CostSummary,
}

impl PersistedQuote {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid(&self.id)?;
        self.items.iter().try_for_each(PersistedItem::validate)
    }
}

// =============================================================================
// Emitter
// =============================================================================

/// Legacy classification label written in front of the item name.
pub fn reason_label(category: Category) -> &'static str {
    match category {
        Category::Labor => "Labor",
        Category::Product => "Product",
        Category::OwnedEquipment => "Equipment",
        Category::RentedEquipment => "Equipment rental",
        Category::Subcontract => "Subcontract",
        Category::Consumable => "Consumable",
        Category::Transport => "Transport",
    }
}

/// Flattens a priced quote for storage.
///
/// `priced` must come from pricing `inputs`; items are matched by position.
pub fn persist(inputs: &[LineItemInput], priced: &PricedQuote) -> Vec<PersistedItem> {
    inputs
        .iter()
        .zip(&priced.items)
        .map(|(input, item)| PersistedItem {
            id: item.catalog_id.clone(),
            category: Some(item.category),
            reason: format!("{} - {}", reason_label(item.category), item.name),
            quantity: item.quantity,
            unit_price: item.unit_price,
            total_price: item.cost,
            associated_product_id: input
                .allocation()
                .and_then(AllocationHint::single_product)
                .map(str::to_string),
            notes: Some(item.name.clone()),
            detail: Some(detail_of(input, item)),
        })
        .collect()
}

fn detail_of(input: &LineItemInput, item: &PricedItem) -> ItemDetail {
    let mut detail = ItemDetail {
        override_price: input.override_price().cloned(),
        allocation: input.allocation().cloned(),
        supplier_unit_price: item.supplier_unit_price,
        supplier_cost: item.supplier_cost,
        ..ItemDetail::default()
    };

    match input {
        LineItemInput::Labor(labor) => {
            detail.hours = Some(labor.period.hours);
            detail.days = Some(labor.period.days);
            detail.linked_products = labor.linked_products.clone();
        }
        LineItemInput::OwnedEquipment(equipment) => {
            detail.hours = Some(equipment.period.hours);
            detail.days = Some(equipment.period.days);
            detail.units = Some(equipment.units);
            detail.add_ons = Some(equipment.add_ons);
        }
        LineItemInput::RentedEquipment(rental) => {
            detail.hours = Some(rental.period.hours);
            detail.days = Some(rental.period.days);
            detail.units = Some(rental.units);
            detail.add_ons = Some(rental.add_ons);
        }
        LineItemInput::Consumable(consumable) => {
            detail.requested_quantity = Some(consumable.quantity);
        }
        LineItemInput::Product(_) | LineItemInput::Subcontract(_) | LineItemInput::Transport(_) => {}
    }

    detail
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::price_items;
    use crate::catalog::{CatalogSnapshot, ConsumableEntry, ProductEntry};
    use crate::line_item::{ConsumableInput, ProductInput};

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot {
            products: vec![ProductEntry {
                id: "cake".to_string(),
                name: "Wedding cake".to_string(),
                unit_price: Money::from_minor(25_000),
            }],
            consumables: vec![ConsumableEntry {
                id: "napkins".to_string(),
                name: "Napkins".to_string(),
                unit_price: Money::from_minor(50),
                minimum_quantity: Decimal::from(50),
            }],
            ..CatalogSnapshot::default()
        }
    }

    fn inputs() -> Vec<LineItemInput> {
        vec![
            LineItemInput::Product(ProductInput {
                product_id: "cake".to_string(),
                quantity: Decimal::from(2),
                override_price: None,
            }),
            LineItemInput::Consumable(ConsumableInput {
                consumable_id: "napkins".to_string(),
                quantity: Decimal::from(10),
                override_price: None,
                allocation: Some(AllocationHint::Product {
                    product_id: "cake".to_string(),
                }),
            }),
        ]
    }

    #[test]
    fn test_persist_writes_tag_reason_and_detail() {
        let inputs = inputs();
        let priced = price_items(&inputs, &catalog()).unwrap();
        let items = persist(&inputs, &priced);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].category, Some(Category::Product));
        assert_eq!(items[0].reason, "Product - Wedding cake");
        assert_eq!(items[0].total_price.minor(), 50_000);

        let napkins = &items[1];
        assert_eq!(napkins.reason, "Consumable - Napkins");
        assert_eq!(napkins.quantity, Decimal::from(50));
        assert_eq!(napkins.associated_product_id.as_deref(), Some("cake"));
        assert_eq!(
            napkins.detail.as_ref().and_then(|d| d.requested_quantity),
            Some(Decimal::from(10))
        );
    }

    #[test]
    fn test_legacy_record_without_detail_parses() {
        let json = r#"{
            "id": "cake",
            "reason": "Producto - Torta",
            "quantity": "2",
            "unitPrice": 25000,
            "totalPrice": 50000
        }"#;
        let item: PersistedItem = serde_json::from_str(json).unwrap();
        assert!(item.category.is_none());
        assert!(item.detail.is_none());
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_quote_validation_requires_uuid() {
        let quote = PersistedQuote {
            id: "quote-1".to_string(),
            saved_at: Utc::now(),
            pricing: PricingConfig::default(),
            items: Vec::new(),
            summary: CostSummary::default(),
        };
        assert!(quote.validate().is_err());

        let quote = PersistedQuote {
            id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            ..quote
        };
        assert!(quote.validate().is_ok());
    }
}
