use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use comptoir_core::{ProductId, TenantId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Archived,
}

/// Configured prices in the tenant's base currency.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PricingMetadata {
    /// Default sale price when a sale line omits one.
    pub sale_price: Decimal,
    /// Last known purchase price (informational; receipts carry their own cost).
    pub purchase_price: Decimal,
}

/// A product as configured for one tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub status: ProductStatus,
    pub pricing: PricingMetadata,
}

impl Product {
    pub fn new(id: ProductId, sku: impl Into<String>, name: impl Into<String>, sale_price: Decimal) -> Self {
        Self {
            id,
            sku: sku.into(),
            name: name.into(),
            status: ProductStatus::Active,
            pricing: PricingMetadata {
                sale_price,
                purchase_price: Decimal::ZERO,
            },
        }
    }

    pub fn with_purchase_price(mut self, purchase_price: Decimal) -> Self {
        self.pricing.purchase_price = purchase_price;
        self
    }

    pub fn archived(mut self) -> Self {
        self.status = ProductStatus::Archived;
        self
    }

    /// Archived products stay in the ledger but can no longer be sold.
    pub fn can_be_sold(&self) -> bool {
        matches!(self.status, ProductStatus::Active)
    }
}

/// Read access to the tenant's product configuration.
pub trait ProductCatalog: Send + Sync {
    fn product(&self, tenant_id: TenantId, product_id: ProductId) -> Option<Product>;
}
