//! Reconciliation Engine domain: physical inventory counts.
//!
//! An [`InventoryCount`] snapshots the warehouse's ledger quantities at start,
//! collects counted quantities, and on completion plans the adjustments that
//! bring each counted position to its physical quantity. [`analysis`] holds the
//! read-only projections over the counted items.

pub mod analysis;
pub mod count;

pub use analysis::{CompletionSummary, CountSummary, VarianceKind, VarianceReport, VarianceRow};
pub use count::{
    CountCommand, CountEvent, CountId, CountItem, CountStatus, InventoryCount, PlannedAdjustment,
    SnapshotLine,
};
