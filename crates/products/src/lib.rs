//! Product configuration consumed by the stock & ledger engine.
//!
//! Products are maintained by an external catalog; the engine only reads them
//! through [`ProductCatalog`].

pub mod product;

pub use product::{PricingMetadata, Product, ProductCatalog, ProductStatus};
