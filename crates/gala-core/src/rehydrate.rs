//! # Quote Rehydrator
//!
//! Rebuilds typed line-item inputs from a saved flat record so an existing
//! quote can be edited.
//!
//! ## Routing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PersistedItem                                                          │
//! │       │                                                                 │
//! │       ├── category tag present? ──────────────► that category           │
//! │       ├── reason matches keyword table? ──────► first match             │
//! │       └── otherwise ──────────► Product + UnclassifiedReason warning    │
//! │                                                                         │
//! │  Catalog entry exists?                                                  │
//! │       ├── yes, with detail ───► exact input                             │
//! │       ├── yes, legacy ────────► best-effort input, saved total pinned   │
//! │       │                         when the recomputed cost differs        │
//! │       └── no ─────────────────► minimal entry synthesized from the      │
//! │                                 record, saved total pinned if needed    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Price the result against [`Rehydrated::catalog`] so synthesized entries
//! resolve.

use std::collections::HashSet;

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::aggregate::price_item;
use crate::catalog::{
    CatalogLookup, CatalogSnapshot, ConsumableEntry, EquipmentEntry, LaborRate, LayeredCatalog,
    OneTimeCharges, ProductEntry, RateCard, RentalEntry, SubcontractEntry, TransportZone,
};
use crate::error::CoreResult;
use crate::line_item::{
    AddOns, AllocationHint, Category, ConsumableInput, LaborInput, LaborLink, LineItemInput,
    OwnedEquipmentInput, PriceOverride, ProductInput, RentedEquipmentInput, SubcontractInput,
    TransportInput, WorkPeriod,
};
use crate::money::Money;
use crate::persist::{ItemDetail, PersistedItem};
use crate::warning::QuoteWarning;
use crate::FULL_DAY_HOURS;

/// Reason attached to totals pinned from a saved record.
pub const PINNED_TOTAL_REASON: &str = "saved total";

// =============================================================================
// Classification
// =============================================================================

/// Keyword → category, tried in order. Rentals come before equipment so
/// "Equipment rental" is not read as owned equipment.
const REASON_KEYWORDS: &[(&str, Category)] = &[
    ("rental", Category::RentedEquipment),
    ("rented", Category::RentedEquipment),
    ("alquiler", Category::RentedEquipment),
    ("subcontract", Category::Subcontract),
    ("subcontrat", Category::Subcontract),
    ("tercerizado", Category::Subcontract),
    ("equipment", Category::OwnedEquipment),
    ("equipo", Category::OwnedEquipment),
    ("labor", Category::Labor),
    ("labour", Category::Labor),
    ("staff", Category::Labor),
    ("personal", Category::Labor),
    ("mano de obra", Category::Labor),
    ("consumable", Category::Consumable),
    ("insumo", Category::Consumable),
    ("transport", Category::Transport),
    ("flete", Category::Transport),
    ("product", Category::Product),
    ("producto", Category::Product),
];

/// Classifies a legacy reason string.
///
/// The label in front of `" - "` is tried first, then the whole string, so
/// item names rarely override their label.
///
/// ## Example
/// ```rust
/// use gala_core::line_item::Category;
/// use gala_core::rehydrate::classify_reason;
///
/// assert_eq!(classify_reason("Equipment rental - Tent"), Some(Category::RentedEquipment));
/// assert_eq!(classify_reason("Alquiler de sillas"), Some(Category::RentedEquipment));
/// assert_eq!(classify_reason("misc"), None);
/// ```
pub fn classify_reason(reason: &str) -> Option<Category> {
    let lowered = reason.to_lowercase();
    let label = lowered.split(" - ").next().unwrap_or_default();

    // Bound so the array temporary drops before `lowered`.
    let category = [label, lowered.as_str()].into_iter().find_map(|text| {
        REASON_KEYWORDS
            .iter()
            .find(|(keyword, _)| text.contains(keyword))
            .map(|(_, category)| *category)
    });
    category
}

// =============================================================================
// Rehydration
// =============================================================================

/// Inputs rebuilt from a saved record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rehydrated {
    pub inputs: Vec<LineItemInput>,
    /// Entries rebuilt for items whose catalog entry is gone.
    pub synthesized: CatalogSnapshot,
    pub warnings: Vec<QuoteWarning>,
}

impl Rehydrated {
    /// The live catalog with the synthesized entries underneath it.
    pub fn catalog<'a, C: CatalogLookup + ?Sized>(&'a self, live: &'a C) -> LayeredCatalog<'a, C> {
        LayeredCatalog::new(live, &self.synthesized)
    }
}

/// Rebuilds line-item inputs from persisted items.
///
/// Unrecognized reasons and missing catalog entries are warnings, never
/// errors. Only malformed records (negative quantity, empty id) fail.
///
/// Product lines are addressed by id, so a record loaded as a product whose
/// id another product line already holds gets a fresh id and a synthesized
/// entry (see [`QuoteWarning::ProductIdReassigned`]).
pub fn rehydrate<C: CatalogLookup + ?Sized>(items: &[PersistedItem], catalog: &C) -> CoreResult<Rehydrated> {
    let mut synthesized = CatalogSnapshot::new();
    let mut warnings = Vec::new();
    let mut inputs = Vec::with_capacity(items.len());

    let mut classified = Vec::with_capacity(items.len());
    for item in items {
        item.validate()?;
        classified.push(item.category.or_else(|| classify_reason(&item.reason)));
    }

    // Ids of records that are product lines on their own evidence. A
    // record that only falls back to Product never takes one of these.
    let claimed: HashSet<&str> = items
        .iter()
        .zip(&classified)
        .filter(|(_, category)| **category == Some(Category::Product))
        .map(|(item, _)| item.id.as_str())
        .collect();
    let mut product_ids: HashSet<String> = HashSet::new();

    for (index, (item, classification)) in items.iter().zip(classified).enumerate() {
        let category = match classification {
            Some(category) => category,
            None => {
                warn!(item_id = %item.id, reason = %item.reason, "Unrecognized reason, loading as product");
                warnings.push(QuoteWarning::UnclassifiedReason {
                    item_id: item.id.clone(),
                    reason: item.reason.clone(),
                });
                Category::Product
            }
        };

        let reassigned;
        let item = if category == Category::Product {
            let taken = product_ids.contains(&item.id)
                || (classification.is_none() && claimed.contains(item.id.as_str()));
            if taken {
                let assigned_id = fresh_product_id(&item.id, index, &claimed, &product_ids);
                warn!(item_id = %item.id, assigned_id = %assigned_id, "Product id already in use, reassigning");
                warnings.push(QuoteWarning::ProductIdReassigned {
                    item_id: item.id.clone(),
                    assigned_id: assigned_id.clone(),
                });
                reassigned = PersistedItem {
                    id: assigned_id,
                    ..item.clone()
                };
                &reassigned
            } else {
                item
            }
        } else {
            item
        };
        if category == Category::Product {
            product_ids.insert(item.id.clone());
        }

        let known = catalog.contains(category, &item.id);
        if !known && !synthesized.contains(category, &item.id) {
            warn!(item_id = %item.id, category = %category, "Catalog entry missing, synthesizing");
            synthesize(&mut synthesized, category, item);
            warnings.push(QuoteWarning::SynthesizedCatalogEntry {
                category,
                id: item.id.clone(),
            });
        }

        let mut input = match &item.detail {
            Some(detail) => from_detail(category, item, detail),
            None => from_flat(category, item),
        };
        input.validate()?;

        let exact = known && item.detail.is_some();
        if !exact {
            let layered = LayeredCatalog::new(catalog, &synthesized);
            let recomputed = price_item(index, &input, &layered, &mut Vec::new())?.cost;
            if recomputed != item.total_price {
                debug!(
                    item_id = %item.id,
                    recomputed = %recomputed,
                    saved = %item.total_price,
                    "Pinning saved total"
                );
                input.set_override_price(Some(
                    PriceOverride::total(item.total_price).with_reason(PINNED_TOTAL_REASON),
                ));
                warnings.push(QuoteWarning::SavedTotalPinned {
                    item_id: item.id.clone(),
                    recomputed,
                    saved: item.total_price,
                });
            }
        }

        inputs.push(input);
    }

    debug!(
        items = inputs.len(),
        synthesized = synthesized.len(),
        warnings = warnings.len(),
        "Rehydrated quote"
    );

    Ok(Rehydrated {
        inputs,
        synthesized,
        warnings,
    })
}

/// Exact reconstruction from the structured detail.
fn from_detail(category: Category, item: &PersistedItem, detail: &ItemDetail) -> LineItemInput {
    let id = item.id.clone();
    let override_price = detail.override_price.clone();
    let allocation = detail.allocation.clone();
    let period = WorkPeriod::new(
        detail.hours.unwrap_or(FULL_DAY_HOURS),
        detail.days.unwrap_or(1).max(1),
    );
    let units = detail.units.unwrap_or(item.quantity);
    let add_ons = detail.add_ons.unwrap_or_default();

    match category {
        Category::Labor => LineItemInput::Labor(LaborInput {
            employee_id: id,
            period,
            override_price,
            linked_products: detail.linked_products.clone(),
        }),
        Category::Product => LineItemInput::Product(ProductInput {
            product_id: id,
            quantity: item.quantity,
            override_price,
        }),
        Category::OwnedEquipment => LineItemInput::OwnedEquipment(OwnedEquipmentInput {
            equipment_id: id,
            units,
            period,
            add_ons,
            override_price,
            allocation,
        }),
        Category::RentedEquipment => LineItemInput::RentedEquipment(RentedEquipmentInput {
            rental_id: id,
            units,
            period,
            add_ons,
            override_price,
            allocation,
        }),
        Category::Subcontract => LineItemInput::Subcontract(SubcontractInput {
            subcontract_id: id,
            quantity: item.quantity,
            override_price,
            allocation,
        }),
        Category::Consumable => LineItemInput::Consumable(ConsumableInput {
            consumable_id: id,
            quantity: detail.requested_quantity.unwrap_or(item.quantity),
            override_price,
            allocation,
        }),
        Category::Transport => LineItemInput::Transport(TransportInput {
            zone_id: id,
            trips: item.quantity,
            override_price,
            allocation,
        }),
    }
}

/// Best-effort reconstruction from the flat columns only.
///
/// Durations are unknown, so booked resources are read as full days and
/// labor quantity as a day count. Add-ons are not recoverable.
fn from_flat(category: Category, item: &PersistedItem) -> LineItemInput {
    let id = item.id.clone();
    let allocation = item
        .associated_product_id
        .as_ref()
        .map(|product_id| AllocationHint::Product {
            product_id: product_id.clone(),
        });
    let full_day = WorkPeriod::new(FULL_DAY_HOURS, 1);

    match category {
        Category::Labor => LineItemInput::Labor(LaborInput {
            employee_id: id,
            period: WorkPeriod::new(FULL_DAY_HOURS, whole_days(item.quantity)),
            override_price: None,
            linked_products: item
                .associated_product_id
                .iter()
                .map(LaborLink::to)
                .collect(),
        }),
        Category::Product => LineItemInput::Product(ProductInput {
            product_id: id,
            quantity: item.quantity,
            override_price: None,
        }),
        Category::OwnedEquipment => LineItemInput::OwnedEquipment(OwnedEquipmentInput {
            equipment_id: id,
            units: item.quantity,
            period: full_day,
            add_ons: AddOns::default(),
            override_price: None,
            allocation,
        }),
        Category::RentedEquipment => LineItemInput::RentedEquipment(RentedEquipmentInput {
            rental_id: id,
            units: item.quantity,
            period: full_day,
            add_ons: AddOns::default(),
            override_price: None,
            allocation,
        }),
        Category::Subcontract => LineItemInput::Subcontract(SubcontractInput {
            subcontract_id: id,
            quantity: item.quantity,
            override_price: None,
            allocation,
        }),
        Category::Consumable => LineItemInput::Consumable(ConsumableInput {
            consumable_id: id,
            quantity: item.quantity,
            override_price: None,
            allocation,
        }),
        Category::Transport => LineItemInput::Transport(TransportInput {
            zone_id: id,
            trips: item.quantity,
            override_price: None,
            allocation,
        }),
    }
}

/// `"{id}#{index}"`, or the next free suffix when that is taken too.
fn fresh_product_id(id: &str, index: usize, claimed: &HashSet<&str>, used: &HashSet<String>) -> String {
    let mut n = index;
    loop {
        let candidate = format!("{}#{}", id, n);
        if !claimed.contains(candidate.as_str()) && !used.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn whole_days(quantity: Decimal) -> u32 {
    quantity.ceil().to_u32().filter(|days| *days > 0).unwrap_or(1)
}

/// Adds a minimal entry priced from the record's unit price.
fn synthesize(snapshot: &mut CatalogSnapshot, category: Category, item: &PersistedItem) {
    let id = item.id.clone();
    let name = display_name(item);
    let price = item.unit_price;
    let flat_card = RateCard::hourly(price).with_daily(price);
    let supplier_unit = item.detail.as_ref().and_then(|detail| detail.supplier_unit_price);

    match category {
        Category::Labor => snapshot.labor.push(LaborRate {
            id,
            name,
            rate_card: flat_card,
        }),
        Category::Product => snapshot.products.push(ProductEntry {
            id,
            name,
            unit_price: price,
        }),
        Category::OwnedEquipment => snapshot.equipment.push(EquipmentEntry {
            id,
            name,
            rate_card: flat_card,
            operator: None,
            charges: OneTimeCharges::default(),
        }),
        Category::RentedEquipment => {
            let supplier_day = supplier_unit.unwrap_or(price);
            snapshot.rentals.push(RentalEntry {
                id,
                name,
                charged: flat_card,
                supplier: RateCard::hourly(supplier_day).with_daily(supplier_day),
                // Bills every booking at the saved day rate.
                min_rental_hours: FULL_DAY_HOURS,
                charges: item
                    .detail
                    .as_ref()
                    .map(|detail| recovered_charges(detail, item.quantity, supplier_day))
                    .unwrap_or_default(),
            })
        }
        Category::Subcontract => snapshot.subcontracts.push(SubcontractEntry {
            id,
            name,
            supplier_cost: supplier_unit.unwrap_or(price),
            charged_price: price,
            unit: None,
        }),
        Category::Consumable => snapshot.consumables.push(ConsumableEntry {
            id,
            name,
            unit_price: price,
            minimum_quantity: Decimal::ZERO,
        }),
        Category::Transport => snapshot.transport_zones.push(TransportZone {
            id,
            name,
            cost_per_trip: price,
        }),
    }
}

/// One-time charges of a rental whose entry is gone.
///
/// The saved supplier cost is the booked supplier days plus the charges, so
/// the remainder goes on the first requested add-on. Charged and supplier
/// sides carry the same charges, which keeps the embedded margin intact.
fn recovered_charges(detail: &ItemDetail, quantity: Decimal, supplier_day: Money) -> OneTimeCharges {
    let add_ons = detail.add_ons.unwrap_or_default();
    let units = detail.units.unwrap_or(quantity);
    let days = Decimal::from(detail.days.unwrap_or(1).max(1));

    let booked = supplier_day
        .checked_mul_quantity(days)
        .and_then(|cost| cost.checked_mul_quantity(units));
    let remainder = match (detail.supplier_cost, booked) {
        (Some(total), Some(booked)) if total > booked => total - booked,
        _ => return OneTimeCharges::default(),
    };

    let mut charges = OneTimeCharges::default();
    if add_ons.setup {
        charges.setup = Some(remainder);
    } else if add_ons.delivery {
        charges.delivery = Some(remainder);
    } else if add_ons.pickup {
        charges.pickup = Some(remainder);
    }
    charges
}

/// Notes first, then the text after the reason label, then the id.
fn display_name(item: &PersistedItem) -> String {
    item.notes
        .as_deref()
        .filter(|notes| !notes.trim().is_empty())
        .or_else(|| item.reason.split_once(" - ").map(|(_, name)| name.trim()))
        .filter(|name| !name.is_empty())
        .unwrap_or(item.id.as_str())
        .to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
