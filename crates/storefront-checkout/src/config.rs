//! # Checkout Configuration
//!
//! Store settings for the checkout session.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     STOREFRONT_TAX_RATE=18                                             │
//! │     STOREFRONT_SHIPPING_CHARGE=99                                      │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/storefront/storefront.toml (Linux)                       │
//! │     ~/Library/Application Support/com.storefront.checkout/ (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     18% GST, free shipping from ₹999, ₹99 flat shipping                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # storefront.toml
//! [store]
//! name = "Inkwell Apparel"
//! currency_code = "INR"
//! currency_symbol = "₹"
//!
//! [pricing]
//! tax_rate_percent = 18.0
//! free_shipping_threshold = 999.0
//! shipping_charge = 99.0
//! ```
//!
//! Amounts in the file are decimal rupees, the same unit the admin console
//! shows. They become [`Money`] once, in [`CheckoutConfig::store_settings`].

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use storefront_core::validation::validate_store_settings;
use storefront_core::{Money, StoreSettings, TaxRate};
use tracing::{debug, info, warn};

use crate::error::{CheckoutError, CheckoutResult};

/// Environment variable prefix for overrides.
const ENV_PREFIX: &str = "STOREFRONT_";

// =============================================================================
// Store Info
// =============================================================================

/// Display details for the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreInfo {
    #[serde(default = "default_store_name")]
    pub name: String,

    /// ISO 4217 code.
    #[serde(default = "default_currency_code")]
    pub currency_code: String,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_store_name() -> String {
    "Storefront".to_string()
}

fn default_currency_code() -> String {
    "INR".to_string()
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

impl Default for StoreInfo {
    fn default() -> Self {
        StoreInfo {
            name: default_store_name(),
            currency_code: default_currency_code(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

// =============================================================================
// Pricing Settings
// =============================================================================

/// Pricing knobs as they appear in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingSettings {
    /// GST for standard lines without their own rate, in percent.
    #[serde(default = "default_tax_rate_percent")]
    pub tax_rate_percent: f64,

    /// Subtotal (rupees) from which shipping is free.
    #[serde(default = "default_free_shipping_threshold")]
    pub free_shipping_threshold: f64,

    /// Flat shipping charge (rupees) below the threshold.
    #[serde(default = "default_shipping_charge")]
    pub shipping_charge: f64,
}

fn default_tax_rate_percent() -> f64 {
    storefront_core::DEFAULT_STORE_TAX_RATE.percentage()
}

fn default_free_shipping_threshold() -> f64 {
    storefront_core::DEFAULT_FREE_SHIPPING_THRESHOLD.to_decimal()
}

fn default_shipping_charge() -> f64 {
    storefront_core::DEFAULT_SHIPPING_CHARGE.to_decimal()
}

impl Default for PricingSettings {
    fn default() -> Self {
        PricingSettings {
            tax_rate_percent: default_tax_rate_percent(),
            free_shipping_threshold: default_free_shipping_threshold(),
            shipping_charge: default_shipping_charge(),
        }
    }
}

// =============================================================================
// Checkout Config
// =============================================================================

/// Complete checkout configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutConfig {
    #[serde(default)]
    pub store: StoreInfo,

    #[serde(default)]
    pub pricing: PricingSettings,
}

impl CheckoutConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (storefront.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> CheckoutResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading checkout config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load checkout config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> CheckoutResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| CheckoutError::Config("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Checkout config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CheckoutResult<()> {
        let p = &self.pricing;
        for (field, value) in [
            ("tax_rate_percent", p.tax_rate_percent),
            ("free_shipping_threshold", p.free_shipping_threshold),
            ("shipping_charge", p.shipping_charge),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CheckoutError::Config(format!(
                    "{} must be a non-negative number, got {}",
                    field, value
                )));
            }
        }

        if self.store.currency_code.len() != 3 {
            return Err(CheckoutError::Config(format!(
                "currency_code must be a 3-letter ISO code, got '{}'",
                self.store.currency_code
            )));
        }

        validate_store_settings(&self.store_settings())
            .map_err(|e| CheckoutError::Config(e.to_string()))?;

        Ok(())
    }

    /// Applies `STOREFRONT_*` overrides using `lookup` to read variables.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(name) = var("STORE_NAME") {
            self.store.name = name;
        }

        if let Some(rate) = var("TAX_RATE") {
            match rate.parse::<f64>() {
                Ok(r) => {
                    debug!(tax_rate = r, "Overriding tax rate from environment");
                    self.pricing.tax_rate_percent = r;
                }
                Err(_) => warn!(value = %rate, "Ignoring unparseable STOREFRONT_TAX_RATE"),
            }
        }

        if let Some(threshold) = var("FREE_SHIPPING_THRESHOLD") {
            match threshold.parse::<f64>() {
                Ok(t) => {
                    debug!(threshold = t, "Overriding free shipping threshold from environment");
                    self.pricing.free_shipping_threshold = t;
                }
                Err(_) => warn!(
                    value = %threshold,
                    "Ignoring unparseable STOREFRONT_FREE_SHIPPING_THRESHOLD"
                ),
            }
        }

        if let Some(charge) = var("SHIPPING_CHARGE") {
            match charge.parse::<f64>() {
                Ok(c) => {
                    debug!(shipping_charge = c, "Overriding shipping charge from environment");
                    self.pricing.shipping_charge = c;
                }
                Err(_) => warn!(value = %charge, "Ignoring unparseable STOREFRONT_SHIPPING_CHARGE"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "storefront", "checkout")
            .map(|dirs| dirs.config_dir().join("storefront.toml"))
    }

    /// The settings snapshot handed to the pricing engine.
    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            tax_rate: TaxRate::from_percentage(self.pricing.tax_rate_percent),
            free_shipping_threshold: Money::from_decimal(self.pricing.free_shipping_threshold),
            shipping_charge: Money::from_decimal(self.pricing.shipping_charge),
        }
    }

    /// Formats an amount with the store's currency symbol.
    ///
    /// ```rust
    /// use storefront_checkout::config::CheckoutConfig;
    /// use storefront_core::Money;
    ///
    /// let config = CheckoutConfig::default();
    /// assert_eq!(config.format_currency(Money::from_paise(177_000)), "₹1770.00");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        format!(
            "{}{}{}.{:02}",
            if amount.is_negative() { "-" } else { "" },
            self.store.currency_symbol,
            amount.rupees().abs(),
            amount.paise_part()
        )
    }
}
