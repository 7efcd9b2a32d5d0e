//! # Resource Catalogs
//!
//! Read-only reference data: rates, unit prices, minimums and one-time
//! charges for every resource a quote can use.
//!
//! ## Lookup Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      CatalogLookup (trait)                              │
//! │                                                                         │
//! │   CatalogSnapshot            LayeredCatalog                             │
//! │   ────────────────           ─────────────────────────────────────      │
//! │   Caller-supplied            base (live catalog)                        │
//! │   snapshot, taken at            │  miss                                 │
//! │   invocation time               ▼                                       │
//! │                              overlay (records synthesized by the        │
//! │                              Rehydrator for deleted / inline items)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The core never fetches catalog data itself.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::line_item::Category;
use crate::money::Money;
use crate::FULL_DAY_HOURS;

// =============================================================================
// Rate Card
// =============================================================================

/// Hourly rate with an optional flat daily rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RateCard {
    pub hourly_rate: Money,

    #[serde(default)]
    pub daily_rate: Option<Money>,
}

impl RateCard {
    pub fn hourly(hourly_rate: Money) -> Self {
        RateCard {
            hourly_rate,
            daily_rate: None,
        }
    }

    pub fn with_daily(mut self, daily_rate: Money) -> Self {
        self.daily_rate = Some(daily_rate);
        self
    }

    /// Cost of one day of `hours` hours.
    ///
    /// ## Daily Cutoff
    /// ```text
    /// hours ≥ 8 and daily rate known ──► daily rate
    /// otherwise ──────────────────────► hourly rate × hours
    /// ```
    ///
    /// Returns `None` only on overflow.
    pub fn day_cost(&self, hours: Decimal) -> Option<Money> {
        match self.daily_rate {
            Some(daily) if hours >= FULL_DAY_HOURS => Some(daily),
            _ => self.hourly_rate.checked_mul_quantity(hours),
        }
    }
}

/// One-time charges an equipment entry supports. `None` means unsupported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct OneTimeCharges {
    pub setup: Option<Money>,
    pub delivery: Option<Money>,
    pub pickup: Option<Money>,
}

// =============================================================================
// Catalog Entries
// =============================================================================

/// An employee or staff role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LaborRate {
    pub id: String,
    pub name: String,
    pub rate_card: RateCard,
}

/// A sellable product; each product input becomes a line of the breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductEntry {
    pub id: String,
    pub name: String,
    pub unit_price: Money,
}

/// Equipment the business owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentEntry {
    pub id: String,
    pub name: String,
    pub rate_card: RateCard,
    /// Operator rate, when the equipment can be booked with one.
    #[serde(default)]
    pub operator: Option<RateCard>,
    #[serde(default)]
    pub charges: OneTimeCharges,
}

/// Equipment rented from a supplier. `charged` already contains the
/// business's markup over `supplier`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RentalEntry {
    pub id: String,
    pub name: String,
    pub charged: RateCard,
    pub supplier: RateCard,
    #[serde(default)]
    #[ts(type = "string")]
    pub min_rental_hours: Decimal,
    #[serde(default)]
    pub charges: OneTimeCharges,
}

/// A service bought from a third party and resold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SubcontractEntry {
    pub id: String,
    pub name: String,
    pub supplier_cost: Money,
    pub charged_price: Money,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Disposable supplies sold in minimum lots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ConsumableEntry {
    pub id: String,
    pub name: String,
    pub unit_price: Money,
    #[serde(default)]
    #[ts(type = "string")]
    pub minimum_quantity: Decimal,
}

/// A delivery zone priced per round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransportZone {
    pub id: String,
    pub name: String,
    pub cost_per_trip: Money,
}

// =============================================================================
// Lookup Trait
// =============================================================================

/// Read-only lookup by id for each category's metadata.
pub trait CatalogLookup {
    fn labor(&self, id: &str) -> Option<&LaborRate>;
    fn product(&self, id: &str) -> Option<&ProductEntry>;
    fn equipment(&self, id: &str) -> Option<&EquipmentEntry>;
    fn rental(&self, id: &str) -> Option<&RentalEntry>;
    fn subcontract(&self, id: &str) -> Option<&SubcontractEntry>;
    fn consumable(&self, id: &str) -> Option<&ConsumableEntry>;
    fn transport_zone(&self, id: &str) -> Option<&TransportZone>;

    /// Display name of an entry, if it exists.
    fn name_of(&self, category: Category, id: &str) -> Option<&str> {
        match category {
            Category::Labor => self.labor(id).map(|e| e.name.as_str()),
            Category::Product => self.product(id).map(|e| e.name.as_str()),
            Category::OwnedEquipment => self.equipment(id).map(|e| e.name.as_str()),
            Category::RentedEquipment => self.rental(id).map(|e| e.name.as_str()),
            Category::Subcontract => self.subcontract(id).map(|e| e.name.as_str()),
            Category::Consumable => self.consumable(id).map(|e| e.name.as_str()),
            Category::Transport => self.transport_zone(id).map(|e| e.name.as_str()),
        }
    }

    fn contains(&self, category: Category, id: &str) -> bool {
        self.name_of(category, id).is_some()
    }
}

// =============================================================================
// Catalog Snapshot
// =============================================================================

/// A caller-supplied snapshot of all catalogs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct CatalogSnapshot {
    pub labor: Vec<LaborRate>,
    pub products: Vec<ProductEntry>,
    pub equipment: Vec<EquipmentEntry>,
    pub rentals: Vec<RentalEntry>,
    pub subcontracts: Vec<SubcontractEntry>,
    pub consumables: Vec<ConsumableEntry>,
    pub transport_zones: Vec<TransportZone>,
}

impl CatalogSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.labor.is_empty()
            && self.products.is_empty()
            && self.equipment.is_empty()
            && self.rentals.is_empty()
            && self.subcontracts.is_empty()
            && self.consumables.is_empty()
            && self.transport_zones.is_empty()
    }

    /// Total number of entries across all categories.
    pub fn len(&self) -> usize {
        self.labor.len()
            + self.products.len()
            + self.equipment.len()
            + self.rentals.len()
            + self.subcontracts.len()
            + self.consumables.len()
            + self.transport_zones.len()
    }

    /// Layers `overlay` under this snapshot: ids found here win.
    pub fn layered<'a>(&'a self, overlay: &'a CatalogSnapshot) -> LayeredCatalog<'a, CatalogSnapshot> {
        LayeredCatalog::new(self, overlay)
    }
}

impl CatalogLookup for CatalogSnapshot {
    fn labor(&self, id: &str) -> Option<&LaborRate> {
        self.labor.iter().find(|e| e.id == id)
    }

    fn product(&self, id: &str) -> Option<&ProductEntry> {
        self.products.iter().find(|e| e.id == id)
    }

    fn equipment(&self, id: &str) -> Option<&EquipmentEntry> {
        self.equipment.iter().find(|e| e.id == id)
    }

    fn rental(&self, id: &str) -> Option<&RentalEntry> {
        self.rentals.iter().find(|e| e.id == id)
    }

    fn subcontract(&self, id: &str) -> Option<&SubcontractEntry> {
        self.subcontracts.iter().find(|e| e.id == id)
    }

    fn consumable(&self, id: &str) -> Option<&ConsumableEntry> {
        self.consumables.iter().find(|e| e.id == id)
    }

    fn transport_zone(&self, id: &str) -> Option<&TransportZone> {
        self.transport_zones.iter().find(|e| e.id == id)
    }
}

// =============================================================================
// Layered Catalog
// =============================================================================

/// A live catalog with synthesized entries underneath it.
#[derive(Debug, Clone, Copy)]
pub struct LayeredCatalog<'a, B: CatalogLookup + ?Sized> {
    base: &'a B,
    overlay: &'a CatalogSnapshot,
}

impl<'a, B: CatalogLookup + ?Sized> LayeredCatalog<'a, B> {
    pub fn new(base: &'a B, overlay: &'a CatalogSnapshot) -> Self {
        LayeredCatalog { base, overlay }
    }
}

impl<B: CatalogLookup + ?Sized> CatalogLookup for LayeredCatalog<'_, B> {
    fn labor(&self, id: &str) -> Option<&LaborRate> {
        self.base.labor(id).or_else(|| self.overlay.labor(id))
    }

    fn product(&self, id: &str) -> Option<&ProductEntry> {
        self.base.product(id).or_else(|| self.overlay.product(id))
    }

    fn equipment(&self, id: &str) -> Option<&EquipmentEntry> {
        self.base.equipment(id).or_else(|| self.overlay.equipment(id))
    }

    fn rental(&self, id: &str) -> Option<&RentalEntry> {
        self.base.rental(id).or_else(|| self.overlay.rental(id))
    }

    fn subcontract(&self, id: &str) -> Option<&SubcontractEntry> {
        self.base.subcontract(id).or_else(|| self.overlay.subcontract(id))
    }

    fn consumable(&self, id: &str) -> Option<&ConsumableEntry> {
        self.base.consumable(id).or_else(|| self.overlay.consumable(id))
    }

    fn transport_zone(&self, id: &str) -> Option<&TransportZone> {
        self.base
            .transport_zone(id)
            .or_else(|| self.overlay.transport_zone(id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, price: i64) -> ProductEntry {
        ProductEntry {
            id: id.to_string(),
            name: format!("Product {}", id),
            unit_price: Money::from_minor(price),
        }
    }

    #[test]
    fn test_day_cost_uses_daily_rate_from_eight_hours() {
        let card = RateCard::hourly(Money::from_minor(10_000)).with_daily(Money::from_minor(60_000));

        assert_eq!(card.day_cost(Decimal::from(4)), Some(Money::from_minor(40_000)));
        assert_eq!(card.day_cost(Decimal::new(79, 1)), Some(Money::from_minor(79_000)));
        assert_eq!(card.day_cost(Decimal::from(8)), Some(Money::from_minor(60_000)));
        assert_eq!(card.day_cost(Decimal::from(12)), Some(Money::from_minor(60_000)));
    }

    #[test]
    fn test_day_cost_without_daily_rate_stays_hourly() {
        let card = RateCard::hourly(Money::from_minor(10_000));
        assert_eq!(card.day_cost(Decimal::from(10)), Some(Money::from_minor(100_000)));
    }

    #[test]
    fn test_snapshot_lookup() {
        let mut catalog = CatalogSnapshot::new();
        catalog.products.push(product("cake", 500));

        assert_eq!(catalog.product("cake").map(|p| p.unit_price.minor()), Some(500));
        assert!(catalog.product("pie").is_none());
        assert_eq!(catalog.name_of(Category::Product, "cake"), Some("Product cake"));
        assert!(!catalog.contains(Category::Labor, "cake"));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_layered_lookup_prefers_base() {
        let mut live = CatalogSnapshot::new();
        live.products.push(product("cake", 500));

        let mut synthesized = CatalogSnapshot::new();
        synthesized.products.push(product("cake", 999));
        synthesized.products.push(product("one-off-banner", 1200));

        let layered = live.layered(&synthesized);
        assert_eq!(layered.product("cake").map(|p| p.unit_price.minor()), Some(500));
        assert_eq!(
            layered.product("one-off-banner").map(|p| p.unit_price.minor()),
            Some(1200)
        );
    }

    #[test]
    fn test_snapshot_json_defaults_missing_sections() {
        let json = r#"{ "products": [{ "id": "cake", "name": "Cake", "unitPrice": 500 }] }"#;
        let catalog: CatalogSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.products.len(), 1);
        assert!(catalog.labor.is_empty());
    }
}
