//! Purchasing domain module (supplier purchases, event-sourced).
//!
//! Business rules for the purchase lifecycle, implemented purely as
//! deterministic domain logic (no IO, no storage). Receiving stock and posting
//! the supplier invoice happen in the engine, in the same transaction that
//! persists `PurchaseReceived`.

pub mod purchase;

pub use purchase::{
    Purchase, PurchaseCommand, PurchaseEvent, PurchaseId, PurchaseItem, PurchaseStatus,
};
