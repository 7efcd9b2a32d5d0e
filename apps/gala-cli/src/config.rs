//! # CLI Configuration
//!
//! Default pricing options and reconciliation tolerance.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     GALA_MARGIN_MODE=per_line                                          │
//! │     GALA_MARGIN_PERCENTAGE=30                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, or                                                │
//! │     ~/.config/gala/gala.toml (Linux)                                   │
//! │     ~/Library/Application Support/com.gala.gala/gala.toml (macOS)      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     global margin 0%, retention off, tolerance 1 minor unit per row    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `pricing` block inside a quote request file wins over all of these.
//!
//! ## Configuration File Format
//! ```toml
//! # gala.toml
//! [pricing]
//! margin_mode = "global"   # global | per_line
//! margin_percentage = 30.0
//! retention_enabled = true
//! retention_percentage = 2.5
//!
//! [reconciliation]
//! tolerance_per_line = 1   # minor units
//! ```

use std::path::{Path, PathBuf};

use gala_core::{MarginMode, Money, PricingConfig, QuoteOptions, DEFAULT_TOLERANCE_PER_LINE};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{CliError, CliResult};

// =============================================================================
// Pricing Settings
// =============================================================================

/// Default pricing options, used when a request carries none.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PricingSettings {
    #[serde(default)]
    pub margin_mode: MarginMode,

    #[serde(default)]
    pub margin_percentage: f64,

    #[serde(default)]
    pub retention_enabled: bool,

    #[serde(default)]
    pub retention_percentage: f64,
}

impl PricingSettings {
    pub fn to_pricing_config(&self) -> PricingConfig {
        PricingConfig {
            margin_mode: self.margin_mode,
            margin_percentage: self.margin_percentage,
            retention_enabled: self.retention_enabled,
            retention_percentage: self.retention_percentage,
        }
    }
}

// =============================================================================
// Reconciliation Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationSettings {
    /// Allowed drift per breakdown row, in minor units.
    #[serde(default = "default_tolerance")]
    pub tolerance_per_line: i64,
}

fn default_tolerance() -> i64 {
    DEFAULT_TOLERANCE_PER_LINE.minor()
}

impl Default for ReconciliationSettings {
    fn default() -> Self {
        ReconciliationSettings {
            tolerance_per_line: default_tolerance(),
        }
    }
}

// =============================================================================
// App Configuration
// =============================================================================

/// Complete CLI configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub reconciliation: ReconciliationSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (gala.toml)
    /// 3. Environment variables
    ///
    /// An explicit `--config` path that does not exist is an error; a
    /// missing file in the platform config dir is not.
    pub fn load(config_path: Option<&Path>) -> CliResult<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn from_file(path: &Path) -> CliResult<Self> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Rejects settings the engine would reject on every quote.
    pub fn validate(&self) -> CliResult<()> {
        if self.reconciliation.tolerance_per_line < 0 {
            return Err(CliError::InvalidConfig(format!(
                "tolerance_per_line must not be negative, got: {}",
                self.reconciliation.tolerance_per_line
            )));
        }

        self.pricing
            .to_pricing_config()
            .normalize()
            .map_err(|e| CliError::InvalidConfig(e.to_string()))?;

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `GALA_*` overrides from any variable source.
    ///
    /// Unparseable values are logged and ignored.
    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(mode) = var("GALA_MARGIN_MODE") {
            match mode.parse() {
                Ok(parsed) => {
                    debug!(mode = %mode, "Overriding margin mode from environment");
                    self.pricing.margin_mode = parsed;
                }
                Err(_) => warn!(mode = %mode, "Unknown margin mode in environment"),
            }
        }

        if let Some(value) = var("GALA_MARGIN_PERCENTAGE") {
            match value.trim().parse::<f64>() {
                Ok(pct) => self.pricing.margin_percentage = pct,
                Err(_) => warn!(value = %value, "Invalid GALA_MARGIN_PERCENTAGE"),
            }
        }

        if let Some(value) = var("GALA_RETENTION_ENABLED") {
            match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.pricing.retention_enabled = true,
                "0" | "false" | "no" | "off" => self.pricing.retention_enabled = false,
                _ => warn!(value = %value, "Invalid GALA_RETENTION_ENABLED"),
            }
        }

        if let Some(value) = var("GALA_RETENTION_PERCENTAGE") {
            match value.trim().parse::<f64>() {
                Ok(pct) => self.pricing.retention_percentage = pct,
                Err(_) => warn!(value = %value, "Invalid GALA_RETENTION_PERCENTAGE"),
            }
        }

        if let Some(value) = var("GALA_TOLERANCE_PER_LINE") {
            match value.trim().parse::<i64>() {
                Ok(minor) => {
                    debug!(tolerance = minor, "Overriding tolerance from environment");
                    self.reconciliation.tolerance_per_line = minor;
                }
                Err(_) => warn!(value = %value, "Invalid GALA_TOLERANCE_PER_LINE"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "gala", "gala")
            .map(|dirs| dirs.config_dir().join("gala.toml"))
    }

    pub fn quote_options(&self) -> QuoteOptions {
        QuoteOptions {
            tolerance_per_line: Money::from_minor(self.reconciliation.tolerance_per_line),
        }
    }
}
