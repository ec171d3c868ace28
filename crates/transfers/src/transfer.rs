use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use comptoir_core::{
    Aggregate, AggregateRoot, DomainError, ProductId, Quantity, TenantId, UserId, WarehouseId,
};
use comptoir_events::Event;

comptoir_core::document_id!(
    /// Transfer identifier.
    TransferId
);

/// `pending → approved → completed`; `cancelled` from `pending` or `approved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Approved,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferItem {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// Aggregate root: Transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    id: TransferId,
    tenant_id: Option<TenantId>,
    source: Option<WarehouseId>,
    destination: Option<WarehouseId>,
    status: TransferStatus,
    items: Vec<TransferItem>,
    approved_by: Option<UserId>,
    version: u64,
    created: bool,
}

impl Transfer {
    pub fn empty(id: TransferId) -> Self {
        Self {
            id,
            tenant_id: None,
            source: None,
            destination: None,
            status: TransferStatus::Pending,
            items: Vec::new(),
            approved_by: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> TransferId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn source(&self) -> Option<WarehouseId> {
        self.source
    }

    pub fn destination(&self) -> Option<WarehouseId> {
        self.destination
    }

    pub fn status(&self) -> TransferStatus {
        self.status
    }

    pub fn items(&self) -> &[TransferItem] {
        &self.items
    }

    pub fn approved_by(&self) -> Option<UserId> {
        self.approved_by
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Source and destination, once created.
    pub fn route(&self) -> Result<(WarehouseId, WarehouseId), DomainError> {
        match (self.source, self.destination) {
            (Some(s), Some(d)) => Ok((s, d)),
            _ => Err(DomainError::invariant("transfer has no route")),
        }
    }
}

impl AggregateRoot for Transfer {
    type Id = TransferId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransferCommand {
    Create {
        tenant_id: TenantId,
        transfer_id: TransferId,
        source: WarehouseId,
        destination: WarehouseId,
        items: Vec<(ProductId, Quantity)>,
        occurred_at: DateTime<Utc>,
    },
    Approve {
        tenant_id: TenantId,
        approved_by: UserId,
        occurred_at: DateTime<Utc>,
    },
    Execute {
        tenant_id: TenantId,
        occurred_at: DateTime<Utc>,
    },
    Cancel {
        tenant_id: TenantId,
        reason: Option<String>,
        occurred_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferEvent {
    TransferCreated {
        tenant_id: TenantId,
        transfer_id: TransferId,
        source: WarehouseId,
        destination: WarehouseId,
        items: Vec<TransferItem>,
        occurred_at: DateTime<Utc>,
    },
    TransferApproved {
        tenant_id: TenantId,
        transfer_id: TransferId,
        approved_by: UserId,
        occurred_at: DateTime<Utc>,
    },
    TransferCompleted {
        tenant_id: TenantId,
        transfer_id: TransferId,
        items: Vec<TransferItem>,
        occurred_at: DateTime<Utc>,
    },
    TransferCancelled {
        tenant_id: TenantId,
        transfer_id: TransferId,
        reason: Option<String>,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for TransferEvent {
    fn event_type(&self) -> &'static str {
        match self {
            TransferEvent::TransferCreated { .. } => "transfers.transfer.created",
            TransferEvent::TransferApproved { .. } => "transfers.transfer.approved",
            TransferEvent::TransferCompleted { .. } => "transfers.transfer.completed",
            TransferEvent::TransferCancelled { .. } => "transfers.transfer.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            TransferEvent::TransferCreated { occurred_at, .. }
            | TransferEvent::TransferApproved { occurred_at, .. }
            | TransferEvent::TransferCompleted { occurred_at, .. }
            | TransferEvent::TransferCancelled { occurred_at, .. } => *occurred_at,
        }
    }
}

impl Aggregate for Transfer {
    type Command = TransferCommand;
    type Event = TransferEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            TransferEvent::TransferCreated {
                tenant_id,
                transfer_id,
                source,
                destination,
                items,
                ..
            } => {
                self.id = *transfer_id;
                self.tenant_id = Some(*tenant_id);
                self.source = Some(*source);
                self.destination = Some(*destination);
                self.items = items.clone();
                self.status = TransferStatus::Pending;
                self.created = true;
            }
            TransferEvent::TransferApproved { approved_by, .. } => {
                self.status = TransferStatus::Approved;
                self.approved_by = Some(*approved_by);
            }
            TransferEvent::TransferCompleted { .. } => {
                self.status = TransferStatus::Completed;
            }
            TransferEvent::TransferCancelled { .. } => {
                self.status = TransferStatus::Cancelled;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            TransferCommand::Create {
                tenant_id,
                transfer_id,
                source,
                destination,
                items,
                occurred_at,
            } => {
                if self.created {
                    return Err(DomainError::conflict("transfer already exists"));
                }
                if source == destination {
                    return Err(DomainError::SameWarehouse);
                }
                if items.is_empty() {
                    return Err(DomainError::EmptyDocument("transfer"));
                }
                if let Some((product, qty)) = items.iter().find(|(_, q)| *q <= 0) {
                    return Err(DomainError::invalid_quantity(format!(
                        "transfer quantity for product {product} must be positive (got {qty})"
                    )));
                }
                let items = items
                    .iter()
                    .enumerate()
                    .map(|(i, (product_id, quantity))| TransferItem {
                        line_no: i as u32 + 1,
                        product_id: *product_id,
                        quantity: *quantity,
                    })
                    .collect();
                Ok(vec![TransferEvent::TransferCreated {
                    tenant_id: *tenant_id,
                    transfer_id: *transfer_id,
                    source: *source,
                    destination: *destination,
                    items,
                    occurred_at: *occurred_at,
                }])
            }
            TransferCommand::Approve {
                tenant_id,
                approved_by,
                occurred_at,
            } => {
                self.ensure_created(*tenant_id)?;
                if self.status != TransferStatus::Pending {
                    return Err(DomainError::invalid_transition("transfer", "approve", self.status));
                }
                Ok(vec![TransferEvent::TransferApproved {
                    tenant_id: *tenant_id,
                    transfer_id: self.id,
                    approved_by: *approved_by,
                    occurred_at: *occurred_at,
                }])
            }
            TransferCommand::Execute {
                tenant_id,
                occurred_at,
            } => {
                self.ensure_created(*tenant_id)?;
                if self.status != TransferStatus::Approved {
                    return Err(DomainError::invalid_transition("transfer", "execute", self.status));
                }
                Ok(vec![TransferEvent::TransferCompleted {
                    tenant_id: *tenant_id,
                    transfer_id: self.id,
                    items: self.items.clone(),
                    occurred_at: *occurred_at,
                }])
            }
            TransferCommand::Cancel {
                tenant_id,
                reason,
                occurred_at,
            } => {
                self.ensure_created(*tenant_id)?;
                if !matches!(self.status, TransferStatus::Pending | TransferStatus::Approved) {
                    return Err(DomainError::invalid_transition("transfer", "cancel", self.status));
                }
                Ok(vec![TransferEvent::TransferCancelled {
                    tenant_id: *tenant_id,
                    transfer_id: self.id,
                    reason: reason.clone(),
                    occurred_at: *occurred_at,
                }])
            }
        }
    }
}

impl Transfer {
    fn ensure_created(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("transfer {}", self.id)));
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }
}
