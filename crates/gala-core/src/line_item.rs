//! # Line Item Inputs
//!
//! The typed inputs the quote form produces, one variant per cost category.
//!
//! ## Category Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Category          Catalog entry     Quantity           Extras          │
//! │  ───────────────   ───────────────   ────────────────   ─────────────── │
//! │  Labor             LaborRate         hours × days       product links   │
//! │  Product           ProductEntry      units              ─               │
//! │  OwnedEquipment    EquipmentEntry    units, hours×days  operator/setup  │
//! │  RentedEquipment   RentalEntry       units, hours×days  delivery/pickup │
//! │  Subcontract       SubcontractEntry  units              ─               │
//! │  Consumable        ConsumableEntry   units (≥ minimum)  ─               │
//! │  Transport         TransportZone     trips              ─               │
//! │                                                                         │
//! │  Every non-product input may carry an AllocationHint for the           │
//! │  Redistributor; Labor carries product links instead.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{
    validate_days, validate_hours, validate_id, validate_price, validate_quantity, ValidationResult,
};

// =============================================================================
// Category
// =============================================================================

/// Cost category of a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Labor,
    Product,
    OwnedEquipment,
    RentedEquipment,
    Subcontract,
    Consumable,
    Transport,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Labor,
        Category::Product,
        Category::OwnedEquipment,
        Category::RentedEquipment,
        Category::Subcontract,
        Category::Consumable,
        Category::Transport,
    ];

    /// Stable tag used in persisted records.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Labor => "labor",
            Category::Product => "product",
            Category::OwnedEquipment => "owned_equipment",
            Category::RentedEquipment => "rented_equipment",
            Category::Subcontract => "subcontract",
            Category::Consumable => "consumable",
            Category::Transport => "transport",
        }
    }

    /// Categories spread over all product lines when nothing narrower applies.
    pub const fn is_ancillary(&self) -> bool {
        matches!(
            self,
            Category::Transport | Category::Consumable | Category::RentedEquipment
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| ValidationError::InvalidFormat {
                field: "category".to_string(),
                reason: format!("unknown category '{}'", s),
            })
    }
}

// =============================================================================
// Shared Input Parts
// =============================================================================

fn one() -> Decimal {
    Decimal::ONE
}

fn one_day() -> u32 {
    1
}

/// How long a resource is booked: `hours` per day over `days` days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct WorkPeriod {
    #[ts(type = "string")]
    pub hours: Decimal,

    #[serde(default = "one_day")]
    pub days: u32,
}

impl WorkPeriod {
    pub fn new(hours: Decimal, days: u32) -> Self {
        WorkPeriod { hours, days }
    }

    /// A single day of `hours` hours.
    pub fn hours(hours: i64) -> Self {
        WorkPeriod {
            hours: Decimal::from(hours),
            days: 1,
        }
    }

    fn validate(&self) -> ValidationResult<()> {
        validate_hours(self.hours)?;
        validate_days(self.days)
    }
}

/// What an override price replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OverrideBasis {
    /// Replaces the billing-unit rate (unit price, day rate, trip cost).
    /// Add-ons are still charged.
    #[default]
    Unit,
    /// Replaces the item's entire computed cost, add-ons included.
    Total,
}

/// A manual price set on a single line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceOverride {
    pub price: Money,

    #[serde(default)]
    pub basis: OverrideBasis,

    /// Free-text justification shown to reviewers.
    #[serde(default)]
    pub reason: Option<String>,
}

impl PriceOverride {
    pub fn unit(price: Money) -> Self {
        PriceOverride {
            price,
            basis: OverrideBasis::Unit,
            reason: None,
        }
    }

    pub fn total(price: Money) -> Self {
        PriceOverride {
            price,
            basis: OverrideBasis::Total,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// The unit rate to use, if this override replaces it.
    pub(crate) fn unit_price(override_price: Option<&PriceOverride>) -> Option<Money> {
        override_price
            .filter(|o| o.basis == OverrideBasis::Unit)
            .map(|o| o.price)
    }

    /// The whole-item cost to use, if this override replaces it.
    pub(crate) fn total_price(override_price: Option<&PriceOverride>) -> Option<Money> {
        override_price
            .filter(|o| o.basis == OverrideBasis::Total)
            .map(|o| o.price)
    }
}

/// Optional one-time and operator charges for equipment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct AddOns {
    pub operator: bool,
    pub setup: bool,
    pub delivery: bool,
    pub pickup: bool,
}

impl AddOns {
    pub fn is_empty(&self) -> bool {
        !(self.operator || self.setup || self.delivery || self.pickup)
    }
}

// =============================================================================
// Allocation Hints
// =============================================================================

/// One row of a manual allocation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AllocationEntry {
    pub product_id: String,

    #[ts(type = "string")]
    pub quantity: Decimal,
}

/// Manual instructions for where an ancillary cost lands among product lines.
/// No hint means "distribute automatically".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AllocationHint {
    /// Proportional to stated per-product quantities.
    QuantityTable { entries: Vec<AllocationEntry> },

    /// Entirely on one product line.
    Product {
        #[serde(rename = "productId")]
        product_id: String,
    },

    /// Evenly over a hand-picked subset of product lines.
    Selection {
        #[serde(rename = "productIds")]
        product_ids: Vec<String>,
    },
}

impl AllocationHint {
    /// The single associated product, if the hint is that simple.
    pub fn single_product(&self) -> Option<&str> {
        match self {
            AllocationHint::Product { product_id } => Some(product_id),
            _ => None,
        }
    }

    fn validate(&self) -> ValidationResult<()> {
        match self {
            AllocationHint::QuantityTable { entries } => {
                for entry in entries {
                    validate_id("allocation.product_id", &entry.product_id)?;
                    validate_quantity("allocation.quantity", entry.quantity)?;
                }
                Ok(())
            }
            AllocationHint::Product { product_id } => validate_id("allocation.product_id", product_id),
            AllocationHint::Selection { product_ids } => product_ids
                .iter()
                .try_for_each(|id| validate_id("allocation.product_ids", id)),
        }
    }
}

/// A labor input's link to a product it works on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LaborLink {
    pub product_id: String,

    /// Declared hours on this product; splits by hours when every link has them.
    #[serde(default)]
    #[ts(type = "string | null")]
    pub hours: Option<Decimal>,
}

impl LaborLink {
    pub fn to(product_id: impl Into<String>) -> Self {
        LaborLink {
            product_id: product_id.into(),
            hours: None,
        }
    }
}

// =============================================================================
// Per-Category Inputs
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LaborInput {
    pub employee_id: String,
    pub period: WorkPeriod,
    #[serde(default)]
    pub override_price: Option<PriceOverride>,
    #[serde(default)]
    pub linked_products: Vec<LaborLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub product_id: String,
    #[ts(type = "string")]
    pub quantity: Decimal,
    #[serde(default)]
    pub override_price: Option<PriceOverride>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OwnedEquipmentInput {
    pub equipment_id: String,
    #[serde(default = "one")]
    #[ts(type = "string")]
    pub units: Decimal,
    pub period: WorkPeriod,
    #[serde(default)]
    pub add_ons: AddOns,
    #[serde(default)]
    pub override_price: Option<PriceOverride>,
    #[serde(default)]
    pub allocation: Option<AllocationHint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RentedEquipmentInput {
    pub rental_id: String,
    #[serde(default = "one")]
    #[ts(type = "string")]
    pub units: Decimal,
    pub period: WorkPeriod,
    #[serde(default)]
    pub add_ons: AddOns,
    #[serde(default)]
    pub override_price: Option<PriceOverride>,
    #[serde(default)]
    pub allocation: Option<AllocationHint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SubcontractInput {
    pub subcontract_id: String,
    #[ts(type = "string")]
    pub quantity: Decimal,
    #[serde(default)]
    pub override_price: Option<PriceOverride>,
    #[serde(default)]
    pub allocation: Option<AllocationHint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ConsumableInput {
    pub consumable_id: String,
    #[ts(type = "string")]
    pub quantity: Decimal,
    #[serde(default)]
    pub override_price: Option<PriceOverride>,
    #[serde(default)]
    pub allocation: Option<AllocationHint>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransportInput {
    pub zone_id: String,
    #[serde(default = "one")]
    #[ts(type = "string")]
    pub trips: Decimal,
    #[serde(default)]
    pub override_price: Option<PriceOverride>,
    #[serde(default)]
    pub allocation: Option<AllocationHint>,
}

// =============================================================================
// Line Item Input
// =============================================================================

/// One line of a quote as composed in the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum LineItemInput {
    Labor(LaborInput),
    Product(ProductInput),
    OwnedEquipment(OwnedEquipmentInput),
    RentedEquipment(RentedEquipmentInput),
    Subcontract(SubcontractInput),
    Consumable(ConsumableInput),
    Transport(TransportInput),
}

impl LineItemInput {
    pub fn category(&self) -> Category {
        match self {
            LineItemInput::Labor(_) => Category::Labor,
            LineItemInput::Product(_) => Category::Product,
            LineItemInput::OwnedEquipment(_) => Category::OwnedEquipment,
            LineItemInput::RentedEquipment(_) => Category::RentedEquipment,
            LineItemInput::Subcontract(_) => Category::Subcontract,
            LineItemInput::Consumable(_) => Category::Consumable,
            LineItemInput::Transport(_) => Category::Transport,
        }
    }

    /// Id of the backing catalog entry.
    pub fn catalog_id(&self) -> &str {
        match self {
            LineItemInput::Labor(i) => &i.employee_id,
            LineItemInput::Product(i) => &i.product_id,
            LineItemInput::OwnedEquipment(i) => &i.equipment_id,
            LineItemInput::RentedEquipment(i) => &i.rental_id,
            LineItemInput::Subcontract(i) => &i.subcontract_id,
            LineItemInput::Consumable(i) => &i.consumable_id,
            LineItemInput::Transport(i) => &i.zone_id,
        }
    }

    pub fn override_price(&self) -> Option<&PriceOverride> {
        match self {
            LineItemInput::Labor(i) => i.override_price.as_ref(),
            LineItemInput::Product(i) => i.override_price.as_ref(),
            LineItemInput::OwnedEquipment(i) => i.override_price.as_ref(),
            LineItemInput::RentedEquipment(i) => i.override_price.as_ref(),
            LineItemInput::Subcontract(i) => i.override_price.as_ref(),
            LineItemInput::Consumable(i) => i.override_price.as_ref(),
            LineItemInput::Transport(i) => i.override_price.as_ref(),
        }
    }

    pub fn set_override_price(&mut self, override_price: Option<PriceOverride>) {
        let slot = match self {
            LineItemInput::Labor(i) => &mut i.override_price,
            LineItemInput::Product(i) => &mut i.override_price,
            LineItemInput::OwnedEquipment(i) => &mut i.override_price,
            LineItemInput::RentedEquipment(i) => &mut i.override_price,
            LineItemInput::Subcontract(i) => &mut i.override_price,
            LineItemInput::Consumable(i) => &mut i.override_price,
            LineItemInput::Transport(i) => &mut i.override_price,
        };
        *slot = override_price;
    }

    pub fn allocation(&self) -> Option<&AllocationHint> {
        match self {
            LineItemInput::Labor(_) | LineItemInput::Product(_) => None,
            LineItemInput::OwnedEquipment(i) => i.allocation.as_ref(),
            LineItemInput::RentedEquipment(i) => i.allocation.as_ref(),
            LineItemInput::Subcontract(i) => i.allocation.as_ref(),
            LineItemInput::Consumable(i) => i.allocation.as_ref(),
            LineItemInput::Transport(i) => i.allocation.as_ref(),
        }
    }

    pub fn labor_links(&self) -> &[LaborLink] {
        match self {
            LineItemInput::Labor(i) => &i.linked_products,
            _ => &[],
        }
    }

    /// Checks the shape of this input without consulting any catalog.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_id("catalog_id", self.catalog_id())?;

        if let Some(o) = self.override_price() {
            validate_price("override_price", o.price)?;
        }
        if let Some(hint) = self.allocation() {
            hint.validate()?;
        }

        match self {
            LineItemInput::Labor(i) => {
                i.period.validate()?;
                for link in &i.linked_products {
                    validate_id("linked_products.product_id", &link.product_id)?;
                    if let Some(hours) = link.hours {
                        validate_quantity("linked_products.hours", hours)?;
                    }
                }
                Ok(())
            }
            LineItemInput::Product(i) => validate_quantity("quantity", i.quantity),
            LineItemInput::OwnedEquipment(i) => {
                validate_quantity("units", i.units)?;
                i.period.validate()
            }
            LineItemInput::RentedEquipment(i) => {
                validate_quantity("units", i.units)?;
                i.period.validate()
            }
            LineItemInput::Subcontract(i) => validate_quantity("quantity", i.quantity),
            LineItemInput::Consumable(i) => validate_quantity("quantity", i.quantity),
            LineItemInput::Transport(i) => validate_quantity("trips", i.trips),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
