//! # gala-core: Pure Quote Logic for Gala
//!
//! This crate prices an event quote. It aggregates heterogeneous costs into
//! an authoritative summary, applies margin and retention, redistributes
//! ancillary costs onto product lines for the client document, and rebuilds
//! inputs from saved quotes. Every function is pure: no I/O, no shared state.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Gala Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Quote form / document export (collaborators)           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    gala-cli (apps/gala-cli)                     │   │
//! │  │      quote, persist, rehydrate · config · logging              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ gala-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   aggregate ──► margin ──► redistribute ──► reconcile          │   │
//! │  │       ▲                                                         │   │
//! │  │   rehydrate ◄── persist                                         │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic and exact splitting
//! - [`pricing`] - Margin mode, rates, pricing configuration
//! - [`catalog`] - Read-only resource catalogs
//! - [`line_item`] - Typed line-item inputs
//! - [`aggregate`] - Cost Aggregator
//! - [`margin`] - Margin & Retention Calculator
//! - [`redistribute`] - Line-Item Redistributor
//! - [`reconcile`] - Reconciliation Guard
//! - [`persist`] / [`rehydrate`] - Saved record format and its inverse
//! - [`quote`] - The whole pipeline in one call
//!
//! ## Design Principles
//!
//! 1. **One Source of Truth**: `CostSummary` is the figure of record; the breakdown only reshapes it
//! 2. **Integer Money**: minor units in `i64`, splits that never lose a unit
//! 3. **All or Nothing**: a malformed input rejects the pass, no partial summary
//! 4. **Warnings are Values**: data-quality findings travel with the result
//!
//! ## Example Usage
//!
//! ```rust
//! use gala_core::money::Money;
//! use gala_core::pricing::Rate;
//!
//! let subtotal = Money::from_minor(1_600_000);
//! let margin = subtotal.apply_rate(Rate::from_bps(3000)); // 30%
//!
//! assert_eq!(margin.minor(), 480_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod catalog;
pub mod error;
pub mod line_item;
pub mod margin;
pub mod money;
pub mod persist;
pub mod pricing;
pub mod quote;
pub mod reconcile;
pub mod redistribute;
pub mod rehydrate;
pub mod summary;
pub mod validation;
pub mod warning;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregate::{aggregate, price_items, PricedItem, PricedQuote};
pub use catalog::{CatalogLookup, CatalogSnapshot, LayeredCatalog};
pub use error::{CoreError, CoreResult, ValidationError};
pub use line_item::{Category, LineItemInput};
pub use margin::{apply_margin_and_retention, MarginOutcome};
pub use money::Money;
pub use persist::{persist, PersistedItem, PersistedQuote};
pub use pricing::{MarginMode, PricingConfig, PricingPolicy, Rate};
pub use quote::{compute_priced, compute_quote, QuoteComputation, QuoteOptions};
pub use reconcile::{verify, Reconciliation};
pub use redistribute::{redistribute, CostBreakdown, ProductLine};
pub use rehydrate::{rehydrate, Rehydrated};
pub use summary::{CategoryCosts, CostSummary};
pub use warning::QuoteWarning;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Hours from which a catalog daily rate replaces hourly billing.
pub const FULL_DAY_HOURS: rust_decimal::Decimal = rust_decimal::Decimal::from_parts(8, 0, 0, false, 0);

/// Most hours a work period may bill per day.
pub const MAX_HOURS_PER_DAY: rust_decimal::Decimal = rust_decimal::Decimal::from_parts(24, 0, 0, false, 0);

/// Highest accepted margin percentage.
///
/// ## Business Reason
/// Catches a misplaced decimal (3000 typed for 30.00) before it reaches
/// a client document.
pub const MAX_MARGIN_PERCENTAGE: f64 = 1000.0;

/// Highest accepted retention percentage. Retention cannot exceed the total.
pub const MAX_RETENTION_PERCENTAGE: f64 = 100.0;

/// Default reconciliation tolerance per breakdown row (one minor unit).
pub const DEFAULT_TOLERANCE_PER_LINE: Money = Money::from_minor(1);
