//! Inter-warehouse transfers (event-sourced).
//!
//! Approval is separate from execution: stock only moves when an approved
//! transfer is executed, and then for every item or for none.

pub mod transfer;

pub use transfer::{Transfer, TransferCommand, TransferEvent, TransferId, TransferItem, TransferStatus};
