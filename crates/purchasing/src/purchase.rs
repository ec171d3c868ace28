use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use comptoir_core::{
    Aggregate, AggregateRoot, DomainError, PointOfSaleId, ProductId, Quantity, Settlement,
    TenantId, WarehouseId, extend,
};
use comptoir_events::Event;

comptoir_core::document_id!(
    /// Purchase identifier (tenant-scoped via `tenant_id` in commands/events).
    PurchaseId
);

/// Purchase status lifecycle.
///
/// `pending → confirmed → received`, with `cancelled` reachable from
/// `pending` and `confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Confirmed,
    Received,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price: Decimal,
}

impl PurchaseItem {
    pub fn value(&self) -> Decimal {
        extend(self.quantity, self.unit_price)
    }
}

/// Aggregate root: Purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    id: PurchaseId,
    tenant_id: Option<TenantId>,
    warehouse_id: Option<WarehouseId>,
    terms: Settlement,
    point_of_sale: Option<PointOfSaleId>,
    status: PurchaseStatus,
    items: Vec<PurchaseItem>,
    version: u64,
    created: bool,
}

impl Purchase {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: PurchaseId) -> Self {
        Self {
            id,
            tenant_id: None,
            warehouse_id: None,
            terms: Settlement::OnAccount,
            point_of_sale: None,
            status: PurchaseStatus::Pending,
            items: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> PurchaseId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn warehouse_id(&self) -> Option<WarehouseId> {
        self.warehouse_id
    }

    pub fn terms(&self) -> Settlement {
        self.terms
    }

    pub fn point_of_sale(&self) -> Option<PointOfSaleId> {
        self.point_of_sale
    }

    pub fn status(&self) -> PurchaseStatus {
        self.status
    }

    pub fn items(&self) -> &[PurchaseItem] {
        &self.items
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn total(&self) -> Decimal {
        self.items.iter().map(PurchaseItem::value).sum()
    }

    /// Items may change until the goods are received or the purchase is cancelled.
    pub fn is_modifiable(&self) -> bool {
        matches!(self.status, PurchaseStatus::Pending | PurchaseStatus::Confirmed)
    }
}

impl AggregateRoot for Purchase {
    type Id = PurchaseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PurchaseCommand {
    Create {
        tenant_id: TenantId,
        purchase_id: PurchaseId,
        warehouse_id: WarehouseId,
        terms: Settlement,
        /// Register paying a cash-settled purchase.
        point_of_sale: Option<PointOfSaleId>,
        occurred_at: DateTime<Utc>,
    },
    AddItem {
        tenant_id: TenantId,
        product_id: ProductId,
        quantity: Quantity,
        unit_price: Decimal,
        occurred_at: DateTime<Utc>,
    },
    Confirm {
        tenant_id: TenantId,
        occurred_at: DateTime<Utc>,
    },
    Receive {
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
pub enum PurchaseEvent {
    PurchaseCreated {
        tenant_id: TenantId,
        purchase_id: PurchaseId,
        warehouse_id: WarehouseId,
        terms: Settlement,
        point_of_sale: Option<PointOfSaleId>,
        occurred_at: DateTime<Utc>,
    },
    PurchaseItemAdded {
        tenant_id: TenantId,
        purchase_id: PurchaseId,
        item: PurchaseItem,
        occurred_at: DateTime<Utc>,
    },
    PurchaseConfirmed {
        tenant_id: TenantId,
        purchase_id: PurchaseId,
        occurred_at: DateTime<Utc>,
    },
    /// Carries the received items so the event alone describes the stock intake.
    PurchaseReceived {
        tenant_id: TenantId,
        purchase_id: PurchaseId,
        warehouse_id: WarehouseId,
        items: Vec<PurchaseItem>,
        total: Decimal,
        occurred_at: DateTime<Utc>,
    },
    PurchaseCancelled {
        tenant_id: TenantId,
        purchase_id: PurchaseId,
        reason: Option<String>,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for PurchaseEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PurchaseEvent::PurchaseCreated { .. } => "purchasing.purchase.created",
            PurchaseEvent::PurchaseItemAdded { .. } => "purchasing.purchase.item_added",
            PurchaseEvent::PurchaseConfirmed { .. } => "purchasing.purchase.confirmed",
            PurchaseEvent::PurchaseReceived { .. } => "purchasing.purchase.received",
            PurchaseEvent::PurchaseCancelled { .. } => "purchasing.purchase.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            PurchaseEvent::PurchaseCreated { occurred_at, .. }
            | PurchaseEvent::PurchaseItemAdded { occurred_at, .. }
            | PurchaseEvent::PurchaseConfirmed { occurred_at, .. }
            | PurchaseEvent::PurchaseReceived { occurred_at, .. }
            | PurchaseEvent::PurchaseCancelled { occurred_at, .. } => *occurred_at,
        }
    }
}

impl Aggregate for Purchase {
    type Command = PurchaseCommand;
    type Event = PurchaseEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            PurchaseEvent::PurchaseCreated {
                tenant_id,
                purchase_id,
                warehouse_id,
                terms,
                point_of_sale,
                ..
            } => {
                self.id = *purchase_id;
                self.tenant_id = Some(*tenant_id);
                self.warehouse_id = Some(*warehouse_id);
                self.terms = *terms;
                self.point_of_sale = *point_of_sale;
                self.status = PurchaseStatus::Pending;
                self.items.clear();
                self.created = true;
            }
            PurchaseEvent::PurchaseItemAdded { item, .. } => {
                self.items.push(item.clone());
            }
            PurchaseEvent::PurchaseConfirmed { .. } => {
                self.status = PurchaseStatus::Confirmed;
            }
            PurchaseEvent::PurchaseReceived { .. } => {
                self.status = PurchaseStatus::Received;
            }
            PurchaseEvent::PurchaseCancelled { .. } => {
                self.status = PurchaseStatus::Cancelled;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            PurchaseCommand::Create {
                tenant_id,
                purchase_id,
                warehouse_id,
                terms,
                point_of_sale,
                occurred_at,
            } => {
                if self.created {
                    return Err(DomainError::conflict("purchase already exists"));
                }
                if terms.requires_cash_ledger_entry() && point_of_sale.is_none() {
                    return Err(DomainError::validation(
                        "a cash-settled purchase needs the paying point of sale",
                    ));
                }
                Ok(vec![PurchaseEvent::PurchaseCreated {
                    tenant_id: *tenant_id,
                    purchase_id: *purchase_id,
                    warehouse_id: *warehouse_id,
                    terms: *terms,
                    point_of_sale: *point_of_sale,
                    occurred_at: *occurred_at,
                }])
            }
            PurchaseCommand::AddItem {
                tenant_id,
                product_id,
                quantity,
                unit_price,
                occurred_at,
            } => {
                self.ensure_created(*tenant_id)?;
                if !self.is_modifiable() {
                    return Err(DomainError::locked("purchase", self.status));
                }
                if *quantity <= 0 {
                    return Err(DomainError::invalid_quantity(format!(
                        "purchase item quantity must be positive (got {quantity})"
                    )));
                }
                if *unit_price < Decimal::ZERO {
                    return Err(DomainError::validation("unit price cannot be negative"));
                }
                Ok(vec![PurchaseEvent::PurchaseItemAdded {
                    tenant_id: *tenant_id,
                    purchase_id: self.id,
                    item: PurchaseItem {
                        line_no: self.items.len() as u32 + 1,
                        product_id: *product_id,
                        quantity: *quantity,
                        unit_price: *unit_price,
                    },
                    occurred_at: *occurred_at,
                }])
            }
            PurchaseCommand::Confirm {
                tenant_id,
                occurred_at,
            } => {
                self.ensure_created(*tenant_id)?;
                if self.status != PurchaseStatus::Pending {
                    return Err(DomainError::invalid_transition("purchase", "confirm", self.status));
                }
                if self.items.is_empty() {
                    return Err(DomainError::EmptyDocument("purchase"));
                }
                Ok(vec![PurchaseEvent::PurchaseConfirmed {
                    tenant_id: *tenant_id,
                    purchase_id: self.id,
                    occurred_at: *occurred_at,
                }])
            }
            PurchaseCommand::Receive {
                tenant_id,
                occurred_at,
            } => {
                self.ensure_created(*tenant_id)?;
                if self.status != PurchaseStatus::Confirmed {
                    return Err(DomainError::invalid_transition("purchase", "receive", self.status));
                }
                let warehouse_id = self
                    .warehouse_id
                    .ok_or_else(|| DomainError::invariant("purchase has no warehouse"))?;
                Ok(vec![PurchaseEvent::PurchaseReceived {
                    tenant_id: *tenant_id,
                    purchase_id: self.id,
                    warehouse_id,
                    items: self.items.clone(),
                    total: self.total(),
                    occurred_at: *occurred_at,
                }])
            }
            PurchaseCommand::Cancel {
                tenant_id,
                reason,
                occurred_at,
            } => {
                self.ensure_created(*tenant_id)?;
                if !self.is_modifiable() {
                    return Err(DomainError::invalid_transition("purchase", "cancel", self.status));
                }
                Ok(vec![PurchaseEvent::PurchaseCancelled {
                    tenant_id: *tenant_id,
                    purchase_id: self.id,
                    reason: reason.clone(),
                    occurred_at: *occurred_at,
                }])
            }
        }
    }
}

impl Purchase {
    fn ensure_created(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("purchase {}", self.id)));
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }
}
