//! Per-tenant configuration consumed by the engine.
//!
//! Loaded once at startup from the JSON document named by `COMPTOIR_CONFIG`;
//! tenants without an override run on the default.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use comptoir_accounting::ChartOfAccounts;
use comptoir_core::{DEFAULT_MONEY_SCALE, TenantId};
use comptoir_inventory::NegativeStockPolicy;

use crate::store::StockRules;

pub const CONFIG_ENV: &str = "COMPTOIR_CONFIG";

/// Where a sale line's unit price comes from when the caller omits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalePriceSource {
    /// Fall back to the product's configured sale price.
    #[default]
    Catalog,
    /// Every sale line must carry its own price.
    Explicit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TenantConfig {
    pub negative_stock: NegativeStockPolicy,
    /// Check availability when a sale line is added, not only at completion.
    pub check_stock_on_add: bool,
    /// Reject sale, transfer and receipt movements in a warehouse being counted.
    pub freeze_counted_warehouses: bool,
    pub sale_price_source: SalePriceSource,
    pub base_currency: String,
    pub money_scale: u32,
    pub chart: ChartOfAccounts,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            negative_stock: NegativeStockPolicy::default(),
            check_stock_on_add: true,
            freeze_counted_warehouses: false,
            sale_price_source: SalePriceSource::default(),
            base_currency: "XOF".to_string(),
            money_scale: DEFAULT_MONEY_SCALE,
            chart: ChartOfAccounts::default(),
        }
    }
}

impl TenantConfig {
    pub fn stock_rules(&self) -> StockRules {
        StockRules {
            negative_stock: self.negative_stock,
            freeze_counted_warehouses: self.freeze_counted_warehouses,
        }
    }
}

/// Supplies the configuration of a tenant.
pub trait TenantConfigSource: Send + Sync {
    fn config(&self, tenant_id: TenantId) -> TenantConfig;
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Shape of the JSON configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct ConfigDocument {
    default: TenantConfig,
    tenants: HashMap<TenantId, TenantConfig>,
}

/// A default configuration plus per-tenant overrides, fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct StaticConfigSource {
    default: TenantConfig,
    overrides: HashMap<TenantId, TenantConfig>,
}

impl StaticConfigSource {
    pub fn new(default: TenantConfig) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    pub fn with_tenant(mut self, tenant_id: TenantId, config: TenantConfig) -> Self {
        self.overrides.insert(tenant_id, config);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let doc: ConfigDocument = serde_json::from_str(json)?;
        Ok(Self {
            default: doc.default,
            overrides: doc.tenants,
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    /// Reads the file named by `COMPTOIR_CONFIG`, or the defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_optional_path(std::env::var(CONFIG_ENV).ok())
    }

    fn from_optional_path(path: Option<String>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if !path.trim().is_empty() => {
                let source = Self::from_file(&path)?;
                tracing::info!(path = %path, tenants = source.overrides.len(), "loaded tenant configuration");
                Ok(source)
            }
            _ => Ok(Self::default()),
        }
    }
}

impl TenantConfigSource for StaticConfigSource {
    fn config(&self, tenant_id: TenantId) -> TenantConfig {
        self.overrides
            .get(&tenant_id)
            .cloned()
            .unwrap_or_else(|| self.default.clone())
    }
}
