use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use comptoir_core::{
    Aggregate, AggregateRoot, DomainError, ProductId, Quantity, TenantId, UserId, WarehouseId,
    round_money,
};
use comptoir_events::Event;

use crate::analysis::CompletionSummary;

comptoir_core::document_id!(
    /// Inventory count identifier.
    CountId
);

/// `started → completed | cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CountStatus {
    Started,
    Completed,
    Cancelled,
}

/// Ledger quantity of one product when the count started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotLine {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountItem {
    pub product_id: ProductId,
    pub expected_quantity: Quantity,
    pub physical_quantity: Quantity,
    /// `physical − expected`.
    pub variance: Quantity,
    /// `variance / expected × 100`, two decimals. `None` when nothing was expected.
    pub variance_percentage: Option<Decimal>,
}

impl CountItem {
    pub fn new(product_id: ProductId, expected_quantity: Quantity, physical_quantity: Quantity) -> Self {
        let variance = physical_quantity - expected_quantity;
        Self {
            product_id,
            expected_quantity,
            physical_quantity,
            variance,
            variance_percentage: percentage(variance, expected_quantity),
        }
    }
}

pub(crate) fn percentage(part: Quantity, whole: Quantity) -> Option<Decimal> {
    if whole == 0 {
        return None;
    }
    Some(round_money(
        Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole),
        2,
    ))
}

/// Adjustment that brings one counted position to its physical quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedAdjustment {
    pub product_id: ProductId,
    pub expected_quantity: Quantity,
    pub physical_quantity: Quantity,
    /// Ledger quantity at completion time.
    pub current_quantity: Quantity,
}

impl PlannedAdjustment {
    /// Signed movement quantity: `physical − current`.
    pub fn delta(&self) -> Quantity {
        self.physical_quantity - self.current_quantity
    }

    /// The position moved between start and completion.
    pub fn drifted(&self) -> bool {
        self.current_quantity != self.expected_quantity
    }
}

/// Aggregate root: InventoryCount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryCount {
    id: CountId,
    tenant_id: Option<TenantId>,
    warehouse_id: Option<WarehouseId>,
    reason: String,
    started_by: Option<UserId>,
    status: CountStatus,
    snapshot: BTreeMap<ProductId, Quantity>,
    /// Recorded items in first-recorded order; re-recording overwrites in place.
    items: Vec<CountItem>,
    outcome: Option<CompletionSummary>,
    version: u64,
    created: bool,
}

impl InventoryCount {
    pub fn empty(id: CountId) -> Self {
        Self {
            id,
            tenant_id: None,
            warehouse_id: None,
            reason: String::new(),
            started_by: None,
            status: CountStatus::Started,
            snapshot: BTreeMap::new(),
            items: Vec::new(),
            outcome: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> CountId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn warehouse_id(&self) -> Option<WarehouseId> {
        self.warehouse_id
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn started_by(&self) -> Option<UserId> {
        self.started_by
    }

    pub fn status(&self) -> CountStatus {
        self.status
    }

    pub fn items(&self) -> &[CountItem] {
        &self.items
    }

    pub fn outcome(&self) -> Option<&CompletionSummary> {
        self.outcome.as_ref()
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Snapshot quantity; products without a position at start expect 0.
    pub fn expected_quantity(&self, product_id: ProductId) -> Quantity {
        self.snapshot.get(&product_id).copied().unwrap_or(0)
    }

    /// Plan one adjustment per counted item against the current ledger quantities.
    ///
    /// Items whose physical quantity already equals the current position yield
    /// a zero delta and are kept so drift can still be reported.
    pub fn plan_adjustments<F>(&self, current_quantity: F) -> Vec<PlannedAdjustment>
    where
        F: Fn(ProductId) -> Quantity,
    {
        self.items
            .iter()
            .map(|item| PlannedAdjustment {
                product_id: item.product_id,
                expected_quantity: item.expected_quantity,
                physical_quantity: item.physical_quantity,
                current_quantity: current_quantity(item.product_id),
            })
            .collect()
    }
}

impl AggregateRoot for InventoryCount {
    type Id = CountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountCommand {
    Start {
        tenant_id: TenantId,
        count_id: CountId,
        warehouse_id: WarehouseId,
        reason: String,
        started_by: UserId,
        /// Ledger quantities of the warehouse, read inside the starting transaction.
        snapshot: Vec<SnapshotLine>,
        occurred_at: DateTime<Utc>,
    },
    RecordItem {
        tenant_id: TenantId,
        product_id: ProductId,
        physical_quantity: Quantity,
        occurred_at: DateTime<Utc>,
    },
    Complete {
        tenant_id: TenantId,
        summary: CompletionSummary,
        occurred_at: DateTime<Utc>,
    },
    Cancel {
        tenant_id: TenantId,
        occurred_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CountEvent {
    CountStarted {
        tenant_id: TenantId,
        count_id: CountId,
        warehouse_id: WarehouseId,
        reason: String,
        started_by: UserId,
        snapshot: Vec<SnapshotLine>,
        occurred_at: DateTime<Utc>,
    },
    CountItemRecorded {
        tenant_id: TenantId,
        count_id: CountId,
        item: CountItem,
        occurred_at: DateTime<Utc>,
    },
    CountCompleted {
        tenant_id: TenantId,
        count_id: CountId,
        summary: CompletionSummary,
        occurred_at: DateTime<Utc>,
    },
    CountCancelled {
        tenant_id: TenantId,
        count_id: CountId,
        discarded_items: usize,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for CountEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CountEvent::CountStarted { .. } => "reconciliation.count.started",
            CountEvent::CountItemRecorded { .. } => "reconciliation.count.item_recorded",
            CountEvent::CountCompleted { .. } => "reconciliation.count.completed",
            CountEvent::CountCancelled { .. } => "reconciliation.count.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CountEvent::CountStarted { occurred_at, .. }
            | CountEvent::CountItemRecorded { occurred_at, .. }
            | CountEvent::CountCompleted { occurred_at, .. }
            | CountEvent::CountCancelled { occurred_at, .. } => *occurred_at,
        }
    }
}

impl Aggregate for InventoryCount {
    type Command = CountCommand;
    type Event = CountEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CountEvent::CountStarted {
                tenant_id,
                count_id,
                warehouse_id,
                reason,
                started_by,
                snapshot,
                ..
            } => {
                self.id = *count_id;
                self.tenant_id = Some(*tenant_id);
                self.warehouse_id = Some(*warehouse_id);
                self.reason = reason.clone();
                self.started_by = Some(*started_by);
                self.snapshot = snapshot.iter().map(|l| (l.product_id, l.quantity)).collect();
                self.items.clear();
                self.status = CountStatus::Started;
                self.created = true;
            }
            CountEvent::CountItemRecorded { item, .. } => {
                match self.items.iter_mut().find(|i| i.product_id == item.product_id) {
                    Some(existing) => *existing = item.clone(),
                    None => self.items.push(item.clone()),
                }
            }
            CountEvent::CountCompleted { summary, .. } => {
                self.status = CountStatus::Completed;
                self.outcome = Some(summary.clone());
            }
            CountEvent::CountCancelled { .. } => {
                self.status = CountStatus::Cancelled;
                self.items.clear();
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CountCommand::Start {
                tenant_id,
                count_id,
                warehouse_id,
                reason,
                started_by,
                snapshot,
                occurred_at,
            } => {
                if self.created {
                    return Err(DomainError::conflict("inventory count already exists"));
                }
                Ok(vec![CountEvent::CountStarted {
                    tenant_id: *tenant_id,
                    count_id: *count_id,
                    warehouse_id: *warehouse_id,
                    reason: reason.clone(),
                    started_by: *started_by,
                    snapshot: snapshot.clone(),
                    occurred_at: *occurred_at,
                }])
            }
            CountCommand::RecordItem {
                tenant_id,
                product_id,
                physical_quantity,
                occurred_at,
            } => {
                self.ensure_created(*tenant_id)?;
                if self.status != CountStatus::Started {
                    return Err(DomainError::locked("inventory count", self.status));
                }
                if *physical_quantity < 0 {
                    return Err(DomainError::invalid_quantity(format!(
                        "physical quantity cannot be negative (got {physical_quantity})"
                    )));
                }
                Ok(vec![CountEvent::CountItemRecorded {
                    tenant_id: *tenant_id,
                    count_id: self.id,
                    item: CountItem::new(
                        *product_id,
                        self.expected_quantity(*product_id),
                        *physical_quantity,
                    ),
                    occurred_at: *occurred_at,
                }])
            }
            CountCommand::Complete {
                tenant_id,
                summary,
                occurred_at,
            } => {
                self.ensure_created(*tenant_id)?;
                if self.status != CountStatus::Started {
                    return Err(DomainError::invalid_transition("inventory count", "complete", self.status));
                }
                if summary.total_items != self.items.len() {
                    return Err(DomainError::invariant(
                        "completion summary does not cover the recorded items",
                    ));
                }
                Ok(vec![CountEvent::CountCompleted {
                    tenant_id: *tenant_id,
                    count_id: self.id,
                    summary: summary.clone(),
                    occurred_at: *occurred_at,
                }])
            }
            CountCommand::Cancel {
                tenant_id,
                occurred_at,
            } => {
                self.ensure_created(*tenant_id)?;
                if self.status != CountStatus::Started {
                    return Err(DomainError::invalid_transition("inventory count", "cancel", self.status));
                }
                Ok(vec![CountEvent::CountCancelled {
                    tenant_id: *tenant_id,
                    count_id: self.id,
                    discarded_items: self.items.len(),
                    occurred_at: *occurred_at,
                }])
            }
        }
    }
}

impl InventoryCount {
    fn ensure_created(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("inventory count {}", self.id)));
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }
}
