//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `ORCHARD_TAX_RATE` - Sales tax rate as a decimal fraction
//!   (default: 0.0825)
//! - `ORCHARD_SHIPPING` - Flat shipping charge (default: 0)
//! - `ORCHARD_GUEST_CART_KEY` - Local-storage key for the guest cart blob
//!   (default: `guest_cart`)

use rust_decimal::Decimal;
use thiserror::Error;

use crate::pricing::PricingConfig;
use crate::storage::DEFAULT_GUEST_CART_KEY;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Pricing policy applied at totals computation and checkout.
    pub pricing: PricingConfig,
    /// Well-known key the guest cart blob is stored under.
    pub guest_cart_key: String,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            pricing: PricingConfig::default(),
            guest_cart_key: DEFAULT_GUEST_CART_KEY.to_string(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set but cannot
    /// be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Some(raw) = read_var("ORCHARD_TAX_RATE") {
            config.pricing.tax_rate = parse_decimal("ORCHARD_TAX_RATE", &raw)?;
        }
        if let Some(raw) = read_var("ORCHARD_SHIPPING") {
            config.pricing.shipping = parse_decimal("ORCHARD_SHIPPING", &raw)?;
        }
        if let Some(key) = read_var("ORCHARD_GUEST_CART_KEY") {
            config.guest_cart_key = key;
        }

        Ok(config)
    }
}

fn read_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_decimal(name: &str, raw: &str) -> Result<Decimal, ConfigError> {
    raw.parse::<Decimal>()
        .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))
}
