//! `comptoir-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives shared by every document type
//! (no infrastructure concerns).

pub mod aggregate;
pub mod document;
pub mod error;
pub mod id;
pub mod money;
pub mod payment;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use document::{DocumentKind, DocumentRef};
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, PointOfSaleId, ProductId, TenantId, UserId, WarehouseId};
pub use money::{DEFAULT_MONEY_SCALE, Quantity, extend, round_money};
pub use payment::{PaymentMethod, Settlement};
