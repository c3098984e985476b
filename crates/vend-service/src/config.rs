//! # Machine Configuration
//!
//! Starting catalog, coin pool and transaction rules.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     VEND_MACHINE_NAME="Lobby Machine"                                  │
//! │     VEND_FUNDS_POLICY=gross                                            │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/vend/vend.toml (Linux)                                   │
//! │     ~/Library/Application Support/com.vend.vend/vend.toml (macOS)      │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     3 products, 22 coins, net funds policy                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [machine]
//! name = "Lobby Machine"
//!
//! [transaction]
//! funds_policy = "net"  # net | gross
//!
//! [[change]]
//! denomination = 10.0
//! count = 3
//!
//! [[products]]
//! name = "Water Bottle"
//! price_cents = 150
//! quantity = 10
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use vend_core::{Amount, CoreError, Denomination, FundsPolicy, Money, Product, ProductId};

use crate::error::ConfigError;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineSettings {
    /// Display name used in logs.
    #[serde(default = "default_machine_name")]
    pub name: String,
}

fn default_machine_name() -> String {
    "Vending Machine".to_string()
}

impl Default for MachineSettings {
    fn default() -> Self {
        MachineSettings {
            name: default_machine_name(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionSettings {
    /// Funds check applied when a product is selected.
    #[serde(default)]
    pub funds_policy: FundsPolicy,
}

/// Coins of one denomination loaded into the change pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinStock {
    /// Face value: 0.5, 1, 2, 5 or 10.
    pub denomination: f64,
    pub count: u32,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductEntry {
    /// Fixed UUID. Generated at load time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub price_cents: i64,
    pub quantity: u32,
}

fn default_change() -> Vec<CoinStock> {
    [(10.0, 3), (5.0, 4), (2.0, 5), (1.0, 5), (0.5, 5)]
        .into_iter()
        .map(|(denomination, count)| CoinStock {
            denomination,
            count,
        })
        .collect()
}

fn default_products() -> Vec<ProductEntry> {
    [("Energy Drink", 2000, 3), ("Water Bottle", 150, 10), ("Sandwich", 400, 5)]
        .into_iter()
        .map(|(name, price_cents, quantity)| ProductEntry {
            id: None,
            name: name.to_string(),
            price_cents,
            quantity,
        })
        .collect()
}

// =============================================================================
// Machine Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    #[serde(default)]
    pub machine: MachineSettings,

    #[serde(default)]
    pub transaction: TransactionSettings,

    #[serde(default = "default_change")]
    pub change: Vec<CoinStock>,

    #[serde(default = "default_products")]
    pub products: Vec<ProductEntry>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            machine: MachineSettings::default(),
            transaction: TransactionSettings::default(),
            change: default_change(),
            products: default_products(),
        }
    }
}

impl MachineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (vend.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading machine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load machine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Validates every entry against the domain rules.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.products.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one product must be configured".into(),
            ));
        }

        self.coins()?;
        let products = self.catalog()?;

        let mut seen = std::collections::HashSet::new();
        for product in &products {
            if !seen.insert(product.id()) {
                return Err(CoreError::DuplicateProduct(product.id()).into());
            }
        }

        Ok(())
    }

    /// Expands the change section into individual coins.
    pub fn coins(&self) -> ConfigResult<Vec<Money>> {
        let mut coins = Vec::new();
        for stock in &self.change {
            let denomination = Denomination::from_value(stock.denomination)?;
            coins.extend(std::iter::repeat(Money::of(denomination)).take(stock.count as usize));
        }
        Ok(coins)
    }

    /// Builds validated products. Entries without an id get a fresh one on
    /// every call.
    pub fn catalog(&self) -> ConfigResult<Vec<Product>> {
        self.products
            .iter()
            .map(|entry| -> ConfigResult<Product> {
                let id = match &entry.id {
                    Some(raw) => raw.parse::<ProductId>().map_err(CoreError::from)?,
                    None => ProductId::new(),
                };
                Ok(Product::new(
                    id,
                    entry.name.as_str(),
                    Amount::from_cents(entry.price_cents),
                    entry.quantity,
                )?)
            })
            .collect()
    }

    pub fn funds_policy(&self) -> FundsPolicy {
        self.transaction.funds_policy
    }

    pub fn machine_name(&self) -> &str {
        &self.machine.name
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from a variable lookup.
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("VEND_MACHINE_NAME") {
            debug!(name = %name, "Overriding machine name from environment");
            self.machine.name = name;
        }

        if let Some(policy) = lookup("VEND_FUNDS_POLICY") {
            match policy.parse() {
                Ok(parsed) => {
                    debug!(policy = %policy, "Overriding funds policy from environment");
                    self.transaction.funds_policy = parsed;
                }
                Err(_) => warn!(policy = %policy, "Unknown funds policy in environment"),
            }
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "vend", "vend")
            .map(|dirs| dirs.config_dir().join("vend.toml"))
    }
}
