//! Property-based invariant tests for the quote pass.
//!
//! Generated quotes mix every category, allocation hints that may or may
//! not name a product line, labor links and both margin modes. For any of
//! them:
//!
//! 1. The breakdown adds up to the summary total, to the minor unit.
//! 2. The summary satisfies `total == subtotal + margin − retention`.
//! 3. Aggregation and the full pass are idempotent.
//! 4. Disabled retention retains nothing.
//! 5. Structured records load back to the exact inputs.
//! 6. Loading against an emptied catalog keeps every cost.

mod common;

use common::*;
use gala_core::line_item::{
    AddOns, AllocationEntry, AllocationHint, ConsumableInput, LaborInput, LaborLink,
    LineItemInput, OwnedEquipmentInput, RentedEquipmentInput, SubcontractInput, TransportInput,
    WorkPeriod,
};
use gala_core::pricing::{MarginMode, PricingConfig};
use gala_core::quote::{compute_quote, QuoteOptions};
use gala_core::{aggregate, persist, price_items, rehydrate, CatalogSnapshot, Category};
use proptest::prelude::*;
use rust_decimal::Decimal;

// ── Helpers ─────────────────────────────────────────────────────────────

const PRODUCT_IDS: [&str; 2] = ["cake", "flowers"];

fn target_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(PRODUCT_IDS.to_vec()).prop_map(str::to_string)
}

fn hint_strategy() -> impl Strategy<Value = Option<AllocationHint>> {
    prop_oneof![
        Just(None),
        target_strategy().prop_map(|product_id| Some(AllocationHint::Product { product_id })),
        prop::collection::vec(target_strategy(), 1..=2)
            .prop_map(|product_ids| Some(AllocationHint::Selection { product_ids })),
        prop::collection::vec((target_strategy(), 1i64..=50), 1..=2).prop_map(|entries| {
            Some(AllocationHint::QuantityTable {
                entries: entries
                    .into_iter()
                    .map(|(product_id, n)| AllocationEntry {
                        product_id,
                        quantity: qty(n),
                    })
                    .collect(),
            })
        }),
    ]
}

fn period_strategy() -> impl Strategy<Value = WorkPeriod> {
    (0i64..=240, 1u32..=3).prop_map(|(tenths, days)| WorkPeriod::new(Decimal::new(tenths, 1), days))
}

fn add_ons_strategy() -> impl Strategy<Value = AddOns> {
    any::<[bool; 4]>().prop_map(|[operator, setup, delivery, pickup]| AddOns {
        operator,
        setup,
        delivery,
        pickup,
    })
}

fn links_strategy() -> impl Strategy<Value = Vec<LaborLink>> {
    prop::collection::vec((target_strategy(), prop::option::of(1i64..=8)), 0..=2).prop_map(|links| {
        links
            .into_iter()
            .map(|(product_id, hours)| LaborLink {
                product_id,
                hours: hours.map(qty),
            })
            .collect()
    })
}

fn ancillary_strategy() -> impl Strategy<Value = LineItemInput> {
    prop_oneof![
        (period_strategy(), links_strategy()).prop_map(|(period, linked_products)| {
            LineItemInput::Labor(LaborInput {
                employee_id: "chef".to_string(),
                period,
                override_price: None,
                linked_products,
            })
        }),
        (0i64..=3, period_strategy(), add_ons_strategy(), hint_strategy()).prop_map(
            |(units, period, add_ons, allocation)| {
                LineItemInput::OwnedEquipment(OwnedEquipmentInput {
                    equipment_id: "speaker".to_string(),
                    units: qty(units),
                    period,
                    add_ons,
                    override_price: None,
                    allocation,
                })
            }
        ),
        (0i64..=3, period_strategy(), add_ons_strategy(), hint_strategy()).prop_map(
            |(units, period, add_ons, allocation)| {
                LineItemInput::RentedEquipment(RentedEquipmentInput {
                    rental_id: "tent".to_string(),
                    units: qty(units),
                    period,
                    add_ons,
                    override_price: None,
                    allocation,
                })
            }
        ),
        (1i64..=3, hint_strategy()).prop_map(|(quantity, allocation)| {
            LineItemInput::Subcontract(SubcontractInput {
                subcontract_id: "dj".to_string(),
                quantity: qty(quantity),
                override_price: None,
                allocation,
            })
        }),
        (0i64..=200, hint_strategy()).prop_map(|(quantity, allocation)| {
            LineItemInput::Consumable(ConsumableInput {
                consumable_id: "napkins".to_string(),
                quantity: qty(quantity),
                override_price: None,
                allocation,
            })
        }),
        (0i64..=4, hint_strategy()).prop_map(|(trips, allocation)| {
            LineItemInput::Transport(TransportInput {
                zone_id: "north".to_string(),
                trips: qty(trips),
                override_price: None,
                allocation,
            })
        }),
    ]
}

/// Each product at most once, ancillaries in any order around them.
fn inputs_strategy() -> impl Strategy<Value = Vec<LineItemInput>> {
    (
        prop::sample::subsequence(PRODUCT_IDS.to_vec(), 0..=PRODUCT_IDS.len()),
        prop::collection::vec(1i64..=5, PRODUCT_IDS.len()),
        prop::collection::vec(ancillary_strategy(), 0..=6),
    )
        .prop_flat_map(|(ids, quantities, ancillaries)| {
            let inputs: Vec<LineItemInput> = ids
                .into_iter()
                .zip(quantities)
                .map(|(id, quantity)| product(id, quantity))
                .chain(ancillaries)
                .collect();
            Just(inputs).prop_shuffle()
        })
}

fn config_strategy() -> impl Strategy<Value = PricingConfig> {
    (
        prop_oneof![Just(MarginMode::Global), Just(MarginMode::PerLine)],
        0u32..=500_000,
        prop::option::of(0u32..=10_000),
    )
        .prop_map(|(mode, margin, retention)| {
            pricing(
                mode,
                f64::from(margin) / 1000.0,
                retention.map(|r| f64::from(r) / 100.0),
            )
        })
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Breakdown and summary agree
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn breakdown_adds_up_to_the_summary(inputs in inputs_strategy(), config in config_strategy()) {
        let quote = compute_quote(&inputs, &catalog(), &config, &QuoteOptions::default()).unwrap();

        prop_assert!(quote.summary.is_consistent(), "summary identity broken: {:?}", quote.summary);
        prop_assert_eq!(
            quote.breakdown.reconciled_total(),
            quote.summary.total,
            "breakdown drifted for {:?}",
            inputs
        );
        prop_assert!(quote.reconciliation.is_ok());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Idempotence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn quote_pass_is_idempotent(inputs in inputs_strategy(), config in config_strategy()) {
        let catalog = catalog();
        let (policy, _) = config.normalize().unwrap();

        prop_assert_eq!(
            aggregate(&inputs, &catalog, &policy).unwrap(),
            aggregate(&inputs, &catalog, &policy).unwrap()
        );
        prop_assert_eq!(
            compute_quote(&inputs, &catalog, &config, &QuoteOptions::default()).unwrap(),
            compute_quote(&inputs, &catalog, &config, &QuoteOptions::default()).unwrap()
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Disabled retention
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn disabled_retention_retains_nothing(inputs in inputs_strategy(), config in config_strategy()) {
        let config = PricingConfig {
            retention_enabled: false,
            ..config
        };
        let quote = compute_quote(&inputs, &catalog(), &config, &QuoteOptions::default()).unwrap();

        prop_assert!(quote.summary.retention_amount.is_zero());
        prop_assert_eq!(
            quote.summary.total,
            quote.summary.subtotal + quote.summary.margin_amount
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Structured round trip
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn structured_records_load_back_exactly(inputs in inputs_strategy(), config in config_strategy()) {
        let catalog = catalog();
        let priced = price_items(&inputs, &catalog).unwrap();

        let restored = rehydrate(&persist(&inputs, &priced), &catalog).unwrap();

        prop_assert_eq!(&restored.inputs, &inputs);
        prop_assert!(restored.synthesized.is_empty());
        prop_assert!(restored.warnings.is_empty(), "{:?}", restored.warnings);

        let (policy, _) = config.normalize().unwrap();
        prop_assert_eq!(
            aggregate(&restored.inputs, &restored.catalog(&catalog), &policy).unwrap(),
            aggregate(&inputs, &catalog, &policy).unwrap()
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Emptied catalog
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn emptied_catalog_keeps_every_cost(inputs in inputs_strategy()) {
        let priced = price_items(&inputs, &catalog()).unwrap();

        let empty = CatalogSnapshot::default();
        let restored = rehydrate(&persist(&inputs, &priced), &empty).unwrap();
        let repriced = price_items(&restored.inputs, &restored.catalog(&empty)).unwrap();

        prop_assert_eq!(repriced.summary.subtotal, priced.summary.subtotal);
        prop_assert_eq!(&repriced.summary.category_costs, &priced.summary.category_costs);

        // Repeated bookings of one deleted rental share the first record's entry.
        let rentals = inputs
            .iter()
            .filter(|input| input.category() == Category::RentedEquipment)
            .count();
        if rentals <= 1 {
            prop_assert_eq!(repriced.summary.embedded_margin, priced.summary.embedded_margin);
        }
    }
}
