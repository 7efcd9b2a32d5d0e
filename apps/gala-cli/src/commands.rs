//! # Command Handlers
//!
//! Each handler reads its JSON files, calls into gala-core and returns a
//! serializable result. Printing happens in [`run`].

use std::path::Path;

use chrono::{DateTime, Utc};
use gala_core::{
    compute_priced, compute_quote, persist, price_items, rehydrate, CatalogSnapshot,
    LineItemInput, Money, PersistedQuote, PricingConfig, QuoteComputation, QuoteWarning,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::args::{Cli, Command, USAGE};
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

// =============================================================================
// Request / Report Types
// =============================================================================

/// A quote as the form submits it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    /// Falls back to the configured defaults when absent.
    #[serde(default)]
    pub pricing: Option<PricingConfig>,

    #[serde(default)]
    pub catalog: CatalogSnapshot,

    pub items: Vec<LineItemInput>,
}

impl QuoteRequest {
    fn pricing_or(&self, config: &AppConfig) -> PricingConfig {
        self.pricing
            .clone()
            .unwrap_or_else(|| config.pricing.to_pricing_config())
    }
}

/// Output of `gala rehydrate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RehydrateReport {
    pub quote_id: String,
    pub inputs: Vec<LineItemInput>,
    /// Catalog entries rebuilt for items the live catalog no longer has.
    pub synthesized: CatalogSnapshot,
    /// Rehydration findings; pricing findings live in `quote.warnings`.
    pub warnings: Vec<QuoteWarning>,
    pub quote: QuoteComputation,
    pub saved_total: Money,
    pub matches_saved_total: bool,
}

// =============================================================================
// Handlers
// =============================================================================

pub fn quote(request: &QuoteRequest, config: &AppConfig) -> CliResult<QuoteComputation> {
    let pricing = request.pricing_or(config);
    let computation = compute_quote(&request.items, &request.catalog, &pricing, &config.quote_options())?;

    if !computation.reconciliation.is_ok() {
        warn!("Breakdown does not reconcile; export the summary only");
    }
    Ok(computation)
}

/// Prices the request and builds the record to save.
///
/// `id` and `saved_at` come from the caller so the record is reproducible
/// in tests.
pub fn persist_quote(
    request: &QuoteRequest,
    config: &AppConfig,
    id: Uuid,
    saved_at: DateTime<Utc>,
) -> CliResult<PersistedQuote> {
    let pricing = request.pricing_or(config);
    let priced = price_items(&request.items, &request.catalog)?;
    let computation = compute_priced(&priced, &pricing, &config.quote_options())?;

    let record = PersistedQuote {
        id: id.to_string(),
        saved_at,
        pricing,
        items: persist(&request.items, &priced),
        summary: computation.summary,
    };
    record.validate()?;

    info!(quote_id = %record.id, items = record.items.len(), total = %record.summary.total, "Quote record built");
    Ok(record)
}

/// Rebuilds inputs from a saved record and reprices them with its own
/// pricing options against the live catalog.
pub fn rehydrate_quote(
    saved: &PersistedQuote,
    live: &CatalogSnapshot,
    config: &AppConfig,
) -> CliResult<RehydrateReport> {
    saved.validate()?;

    let rehydrated = rehydrate(&saved.items, live)?;
    let catalog = rehydrated.catalog(live);
    let quote = compute_quote(&rehydrated.inputs, &catalog, &saved.pricing, &config.quote_options())?;

    let matches_saved_total = quote.summary.total == saved.summary.total;
    if !matches_saved_total {
        warn!(
            quote_id = %saved.id,
            saved = %saved.summary.total,
            recomputed = %quote.summary.total,
            "Recomputed total differs from saved total"
        );
    }

    Ok(RehydrateReport {
        quote_id: saved.id.clone(),
        inputs: rehydrated.inputs,
        synthesized: rehydrated.synthesized,
        warnings: rehydrated.warnings,
        saved_total: saved.summary.total,
        quote,
        matches_saved_total,
    })
}

// =============================================================================
// Dispatch
// =============================================================================

/// Runs a parsed command line, printing JSON results to stdout.
pub fn run(cli: Cli) -> CliResult<()> {
    if cli.command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = AppConfig::load(cli.config.as_deref())?;
    debug!(?config, "Configuration loaded");

    match cli.command {
        Command::Quote { input } => {
            let request: QuoteRequest = read_json(&input)?;
            print_json(&quote(&request, &config)?)
        }
        Command::Persist { input } => {
            let request: QuoteRequest = read_json(&input)?;
            print_json(&persist_quote(&request, &config, Uuid::new_v4(), Utc::now())?)
        }
        Command::Rehydrate { input, catalog } => {
            let saved: PersistedQuote = read_json(&input)?;
            let live: CatalogSnapshot = read_json(&catalog)?;
            print_json(&rehydrate_quote(&saved, &live, &config)?)
        }
        Command::Help => Ok(()),
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    debug!(?path, "Reading input");
    let contents = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&contents)?)
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use gala_core::{Category, CoreError, MarginMode};

    const REQUEST: &str = r#"{
        "pricing": { "marginMode": "global", "marginPercentage": 30 },
        "catalog": {
            "products": [
                { "id": "cake", "name": "Wedding cake", "unitPrice": 250000 },
                { "id": "flowers", "name": "Centerpieces", "unitPrice": 125000 }
            ],
            "transportZones": [
                { "id": "north", "name": "North zone", "costPerTrip": 100000 }
            ]
        },
        "items": [
            { "category": "product", "productId": "cake", "quantity": "1" },
            { "category": "product", "productId": "flowers", "quantity": "2" },
            { "category": "transport", "zoneId": "north" }
        ]
    }"#;

    fn request() -> QuoteRequest {
        serde_json::from_str(REQUEST).unwrap()
    }

    fn saved_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_quote_uses_request_pricing() {
        let result = quote(&request(), &AppConfig::default()).unwrap();

        assert_eq!(result.summary.subtotal.minor(), 600_000);
        assert_eq!(result.summary.margin_amount.minor(), 180_000);
        assert_eq!(result.summary.total.minor(), 780_000);
        assert!(result.reconciliation.is_ok());
        assert_eq!(result.breakdown.lines.len(), 2);
    }

    #[test]
    fn test_quote_falls_back_to_config_pricing() {
        let mut request = request();
        request.pricing = None;
        let mut config = AppConfig::default();
        config.pricing.margin_mode = MarginMode::PerLine;
        config.pricing.margin_percentage = 10.0;

        let result = quote(&request, &config).unwrap();
        assert_eq!(result.summary.margin_mode, MarginMode::PerLine);
        assert_eq!(result.summary.total.minor(), 660_000);
    }

    #[test]
    fn test_quote_rejects_unknown_catalog_id() {
        let mut request = request();
        request.catalog.products.clear();

        let err = quote(&request, &AppConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            CliError::Core(CoreError::CatalogEntryNotFound {
                category: Category::Product,
                ..
            })
        ));
    }

    #[test]
    fn test_persist_builds_valid_record() {
        let id = Uuid::new_v4();
        let record = persist_quote(&request(), &AppConfig::default(), id, saved_at()).unwrap();

        assert_eq!(record.id, id.to_string());
        assert_eq!(record.saved_at, saved_at());
        assert_eq!(record.items.len(), 3);
        assert_eq!(record.items[0].category, Some(Category::Product));
        assert_eq!(record.summary.total.minor(), 780_000);
    }

    #[test]
    fn test_persisted_summary_matches_quote() {
        let request = request();
        let config = AppConfig::default();
        let record = persist_quote(&request, &config, Uuid::new_v4(), saved_at()).unwrap();

        assert_eq!(record.summary, quote(&request, &config).unwrap().summary);
        assert_eq!(
            record.items.iter().map(|item| item.total_price).sum::<Money>(),
            record.summary.subtotal
        );
    }

    #[test]
    fn test_persist_then_rehydrate_matches_saved_total() {
        let request = request();
        let config = AppConfig::default();
        let record = persist_quote(&request, &config, Uuid::new_v4(), saved_at()).unwrap();

        let json = serde_json::to_string(&record).unwrap();
        let saved: PersistedQuote = serde_json::from_str(&json).unwrap();
        let report = rehydrate_quote(&saved, &request.catalog, &config).unwrap();

        assert!(report.matches_saved_total);
        assert_eq!(report.inputs, request.items);
        assert!(report.synthesized.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_rehydrate_with_emptied_catalog_keeps_total() {
        let request = request();
        let config = AppConfig::default();
        let record = persist_quote(&request, &config, Uuid::new_v4(), saved_at()).unwrap();

        let report = rehydrate_quote(&record, &CatalogSnapshot::default(), &config).unwrap();

        assert!(report.matches_saved_total);
        assert_eq!(report.synthesized.len(), 3);
        assert!(report
            .warnings
            .iter()
            .all(|w| matches!(w, QuoteWarning::SynthesizedCatalogEntry { .. })));
    }

    #[test]
    fn test_rehydrate_rejects_bad_quote_id() {
        let mut record =
            persist_quote(&request(), &AppConfig::default(), Uuid::new_v4(), saved_at()).unwrap();
        record.id = "not-a-uuid".to_string();

        let err = rehydrate_quote(&record, &request().catalog, &AppConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::Core(CoreError::Validation(_))));
    }

    #[test]
    fn test_read_json_reports_path() {
        let err = read_json::<QuoteRequest>(Path::new("/nonexistent/quote.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/quote.json"));
    }
}
