//! Ledger Store domain: stock positions and the append-only movement log.
//!
//! A [`StockPosition`] is never written directly. It is the fold of the
//! [`StockMovement`]s for its `(tenant, product, warehouse)` key; the store keeps it
//! materialised incrementally and [`reconstruct`] rebuilds it from the log.

pub mod ledger;
pub mod movement;
pub mod position;

pub use ledger::{PositionMismatch, fold_all, reconstruct, verify};
pub use movement::{Direction, MovementReason, MovementRequest, StockKey, StockMovement};
pub use position::{NegativeStockPolicy, StockPosition};
