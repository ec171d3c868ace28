//! Read-only projections over an inventory count.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use comptoir_core::{ProductId, Quantity, WarehouseId, extend};

use crate::count::{CountId, CountStatus, InventoryCount, percentage};

/// Returned by `complete` and recorded on the `CountCompleted` event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CompletionSummary {
    pub total_items: usize,
    pub items_with_variance: usize,
    /// Items whose ledger position changed between start and completion.
    pub items_with_drift: usize,
    /// Signed net change of the inventory account (gains positive, losses negative).
    pub total_variance_value: Decimal,
    pub gl_entries_created: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountSummary {
    pub total_items: usize,
    pub total_expected: Quantity,
    pub total_physical: Quantity,
    pub total_variance: Quantity,
    pub variance_percentage: Option<Decimal>,
    pub items_with_variance: usize,
    pub surplus_items: usize,
    pub shortage_items: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarianceKind {
    Surplus,
    Shortage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceRow {
    pub product_id: ProductId,
    pub expected_quantity: Quantity,
    pub physical_quantity: Quantity,
    pub variance: Quantity,
    pub variance_percentage: Option<Decimal>,
    pub unit_cost: Decimal,
    /// `|variance| × unit_cost`.
    pub variance_value: Decimal,
    pub kind: VarianceKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarianceReport {
    pub count_id: CountId,
    pub warehouse_id: Option<WarehouseId>,
    pub status: CountStatus,
    pub reason: String,
    pub summary: CountSummary,
    pub analysis: Vec<VarianceRow>,
    pub generated_at: DateTime<Utc>,
}

impl InventoryCount {
    pub fn summary(&self) -> CountSummary {
        let items = self.items();
        let total_expected: Quantity = items.iter().map(|i| i.expected_quantity).sum();
        let total_physical: Quantity = items.iter().map(|i| i.physical_quantity).sum();
        let total_variance: Quantity = items.iter().map(|i| i.variance).sum();
        CountSummary {
            total_items: items.len(),
            total_expected,
            total_physical,
            total_variance,
            variance_percentage: percentage(total_variance, total_expected),
            items_with_variance: items.iter().filter(|i| i.variance != 0).count(),
            surplus_items: items.iter().filter(|i| i.variance > 0).count(),
            shortage_items: items.iter().filter(|i| i.variance < 0).count(),
        }
    }

    /// One row per item with a variance, largest value first.
    ///
    /// `unit_cost` supplies the current average cost of each product in the
    /// count's warehouse.
    pub fn variance_analysis<F>(&self, unit_cost: F) -> Vec<VarianceRow>
    where
        F: Fn(ProductId) -> Decimal,
    {
        let mut rows: Vec<VarianceRow> = self
            .items()
            .iter()
            .filter(|i| i.variance != 0)
            .map(|i| {
                let cost = unit_cost(i.product_id);
                VarianceRow {
                    product_id: i.product_id,
                    expected_quantity: i.expected_quantity,
                    physical_quantity: i.physical_quantity,
                    variance: i.variance,
                    variance_percentage: i.variance_percentage,
                    unit_cost: cost,
                    variance_value: extend(i.variance.abs(), cost),
                    kind: if i.variance > 0 {
                        VarianceKind::Surplus
                    } else {
                        VarianceKind::Shortage
                    },
                }
            })
            .collect();
        rows.sort_by(|a, b| b.variance_value.cmp(&a.variance_value));
        rows
    }

    pub fn report<F>(&self, unit_cost: F, generated_at: DateTime<Utc>) -> VarianceReport
    where
        F: Fn(ProductId) -> Decimal,
    {
        VarianceReport {
            count_id: self.id_typed(),
            warehouse_id: self.warehouse_id(),
            status: self.status(),
            reason: self.reason().to_string(),
            summary: self.summary(),
            analysis: self.variance_analysis(unit_cost),
            generated_at,
        }
    }
}
