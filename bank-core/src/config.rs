//! Configuration for the bank ledger

use crate::currency::{Currency, CurrencyCatalog};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Bank configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base currency code; requests without a currency use it
    pub base_currency: String,

    /// Fall back to the base currency on unrecognized codes
    ///
    /// The reference system silently defaulted unknown currency codes to
    /// the base currency. Off by default: unknown codes fail with
    /// `InvalidCurrency`. Turning this on restores the old behavior and
    /// logs a warning on every fallback.
    pub fallback_to_base: bool,

    /// Currency catalog seed
    pub currencies: Vec<CurrencySeed>,
}

/// One seeded currency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencySeed {
    /// Short unique code, e.g. "CAD"
    pub code: String,

    /// Display name
    pub name: String,

    /// Units of this currency per base unit, must be positive
    pub rate: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_currency: "CAD".to_string(),
            fallback_to_base: false,
            currencies: vec![
                CurrencySeed {
                    code: "CAD".to_string(),
                    name: "Canadian Dollar".to_string(),
                    rate: 100,
                },
                CurrencySeed {
                    code: "USD".to_string(),
                    name: "US Dollar".to_string(),
                    rate: 200,
                },
                CurrencySeed {
                    code: "MXN".to_string(),
                    name: "Mexican Peso".to_string(),
                    rate: 10,
                },
            ],
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::Error::Config(format!("Failed to read config: {e}")))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Load from environment variables, on top of the defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(code) = std::env::var("BANK_BASE_CURRENCY") {
            config.base_currency = code;
        }

        if let Ok(value) = std::env::var("BANK_CURRENCY_FALLBACK") {
            config.fallback_to_base = value == "1" || value.eq_ignore_ascii_case("true");
        }

        Ok(config)
    }

    /// Build the immutable currency catalog from the seed
    pub fn catalog(&self) -> Result<CurrencyCatalog> {
        let currencies = self
            .currencies
            .iter()
            .map(|seed| Currency::new(&seed.code, &seed.name, seed.rate))
            .collect::<Result<Vec<_>>>()?;

        CurrencyCatalog::new(currencies, &self.base_currency)
    }
}
