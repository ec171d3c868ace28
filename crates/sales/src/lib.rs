//! Sales domain module (point-of-sale tickets, event-sourced).
//!
//! Business rules for the sale lifecycle, implemented purely as deterministic
//! domain logic (no IO, no storage). Stock deduction, cash collection and the
//! revenue/COGS posting are performed by the engine when `SaleCompleted` commits.

pub mod sale;

pub use sale::{Payment, Sale, SaleCommand, SaleEvent, SaleId, SaleItem, SaleStatus};
