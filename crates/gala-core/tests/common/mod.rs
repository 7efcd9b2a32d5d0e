//! Shared catalog and input fixtures for the integration tests.

#![allow(dead_code)]

use gala_core::catalog::{
    CatalogSnapshot, ConsumableEntry, EquipmentEntry, LaborRate, OneTimeCharges, ProductEntry,
    RateCard, RentalEntry, SubcontractEntry, TransportZone,
};
use gala_core::line_item::{
    AddOns, AllocationEntry, AllocationHint, ConsumableInput, LaborInput, LaborLink,
    LineItemInput, OwnedEquipmentInput, ProductInput, RentedEquipmentInput, SubcontractInput,
    TransportInput, WorkPeriod,
};
use gala_core::money::Money;
use gala_core::pricing::{MarginMode, PricingConfig};
use rust_decimal::Decimal;

pub fn money(minor: i64) -> Money {
    Money::from_minor(minor)
}

pub fn qty(n: i64) -> Decimal {
    Decimal::from(n)
}

pub fn catalog() -> CatalogSnapshot {
    CatalogSnapshot {
        labor: vec![LaborRate {
            id: "chef".to_string(),
            name: "Head chef".to_string(),
            rate_card: RateCard::hourly(money(125_000)).with_daily(money(1_000_000)),
        }],
        products: vec![
            ProductEntry {
                id: "cake".to_string(),
                name: "Wedding cake".to_string(),
                unit_price: money(200_000),
            },
            ProductEntry {
                id: "flowers".to_string(),
                name: "Centerpieces".to_string(),
                unit_price: money(300_000),
            },
        ],
        equipment: vec![EquipmentEntry {
            id: "speaker".to_string(),
            name: "PA system".to_string(),
            rate_card: RateCard::hourly(money(20_000)).with_daily(money(120_000)),
            operator: Some(RateCard::hourly(money(10_000))),
            charges: OneTimeCharges {
                setup: Some(money(15_000)),
                delivery: Some(money(5_000)),
                pickup: Some(money(5_000)),
            },
        }],
        rentals: vec![RentalEntry {
            id: "tent".to_string(),
            name: "Marquee tent".to_string(),
            charged: RateCard::hourly(money(50_000)).with_daily(money(300_000)),
            supplier: RateCard::hourly(money(30_000)).with_daily(money(200_000)),
            min_rental_hours: qty(4),
            charges: OneTimeCharges {
                setup: None,
                delivery: Some(money(20_000)),
                pickup: None,
            },
        }],
        subcontracts: vec![SubcontractEntry {
            id: "dj".to_string(),
            name: "DJ set".to_string(),
            supplier_cost: money(400_000),
            charged_price: money(550_000),
            unit: Some("set".to_string()),
        }],
        consumables: vec![ConsumableEntry {
            id: "napkins".to_string(),
            name: "Linen napkins".to_string(),
            unit_price: money(500),
            minimum_quantity: qty(50),
        }],
        transport_zones: vec![TransportZone {
            id: "north".to_string(),
            name: "North zone".to_string(),
            cost_per_trip: money(100_000),
        }],
    }
}

pub fn product(id: &str, quantity: i64) -> LineItemInput {
    LineItemInput::Product(ProductInput {
        product_id: id.to_string(),
        quantity: qty(quantity),
        override_price: None,
    })
}

pub fn transport(trips: i64, allocation: Option<AllocationHint>) -> LineItemInput {
    LineItemInput::Transport(TransportInput {
        zone_id: "north".to_string(),
        trips: qty(trips),
        override_price: None,
        allocation,
    })
}

pub fn labor(hours: i64, days: u32, linked_products: Vec<LaborLink>) -> LineItemInput {
    LineItemInput::Labor(LaborInput {
        employee_id: "chef".to_string(),
        period: WorkPeriod::new(qty(hours), days),
        override_price: None,
        linked_products,
    })
}

pub fn consumable(quantity: i64, allocation: Option<AllocationHint>) -> LineItemInput {
    LineItemInput::Consumable(ConsumableInput {
        consumable_id: "napkins".to_string(),
        quantity: qty(quantity),
        override_price: None,
        allocation,
    })
}

/// One input of every category, each ancillary one attached to a product.
pub fn every_category() -> Vec<LineItemInput> {
    vec![
        product("cake", 1),
        product("flowers", 2),
        labor(6, 2, vec![LaborLink::to("cake")]),
        LineItemInput::OwnedEquipment(OwnedEquipmentInput {
            equipment_id: "speaker".to_string(),
            units: qty(2),
            period: WorkPeriod::new(qty(5), 1),
            add_ons: AddOns {
                operator: true,
                setup: true,
                delivery: false,
                pickup: false,
            },
            override_price: None,
            allocation: Some(AllocationHint::Product {
                product_id: "cake".to_string(),
            }),
        }),
        LineItemInput::RentedEquipment(RentedEquipmentInput {
            rental_id: "tent".to_string(),
            units: qty(1),
            period: WorkPeriod::new(qty(2), 1),
            add_ons: AddOns {
                delivery: true,
                ..AddOns::default()
            },
            override_price: None,
            allocation: Some(AllocationHint::Selection {
                product_ids: vec!["cake".to_string(), "flowers".to_string()],
            }),
        }),
        LineItemInput::Subcontract(SubcontractInput {
            subcontract_id: "dj".to_string(),
            quantity: qty(1),
            override_price: None,
            allocation: Some(AllocationHint::Product {
                product_id: "flowers".to_string(),
            }),
        }),
        consumable(
            120,
            Some(AllocationHint::QuantityTable {
                entries: vec![
                    AllocationEntry {
                        product_id: "cake".to_string(),
                        quantity: qty(40),
                    },
                    AllocationEntry {
                        product_id: "flowers".to_string(),
                        quantity: qty(80),
                    },
                ],
            }),
        ),
        transport(3, None),
    ]
}

pub fn pricing(mode: MarginMode, margin: f64, retention: Option<f64>) -> PricingConfig {
    PricingConfig {
        margin_mode: mode,
        margin_percentage: margin,
        retention_enabled: retention.is_some(),
        retention_percentage: retention.unwrap_or(0.0),
    }
}
