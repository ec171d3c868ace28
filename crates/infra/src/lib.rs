//! Infrastructure layer: transactional store, workflow engine, configuration.
//!
//! Domain crates decide; this crate persists. Every engine operation is one
//! [`store::Transaction`] over the tenant's book.

pub mod catalog;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod store;

pub use catalog::InMemoryCatalog;
pub use config::{SalePriceSource, StaticConfigSource, TenantConfig, TenantConfigSource};
pub use context::RequestContext;
pub use engine::{Engine, ExpenseRecord, PurchaseReceipt, SaleCompletion, TransferExecution};
pub use error::{EngineError, EngineResult, StoreError};
pub use store::InMemoryStore;
