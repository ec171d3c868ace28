use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use comptoir_core::{
    Aggregate, AggregateRoot, DomainError, PaymentMethod, PointOfSaleId, ProductId, Quantity,
    TenantId, WarehouseId,
};
use comptoir_events::Event;

comptoir_core::document_id!(
    /// Sale identifier (tenant-scoped via `tenant_id` in commands/events).
    SaleId
);

/// Sale status lifecycle: `pending → completed | cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Pending,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price: Decimal,
    /// `quantity × unit_price`, unrounded.
    pub line_total: Decimal,
}

/// How a completed sale was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    pub amount_paid: Decimal,
    /// `min(amount_paid, total)`: what actually settles the sale.
    pub collected: Decimal,
    /// `max(amount_paid − total, 0)`, handed back to the customer.
    pub change_due: Decimal,
}

impl Payment {
    pub fn settle(method: PaymentMethod, amount_paid: Decimal, total: Decimal) -> Self {
        let collected = amount_paid.min(total);
        Self {
            method,
            amount_paid,
            collected,
            change_due: (amount_paid - total).max(Decimal::ZERO),
        }
    }

    /// Part of the total left on the customer's account.
    pub fn outstanding(&self, total: Decimal) -> Decimal {
        total - self.collected
    }
}

/// Aggregate root: Sale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sale {
    id: SaleId,
    tenant_id: Option<TenantId>,
    warehouse_id: Option<WarehouseId>,
    point_of_sale: Option<PointOfSaleId>,
    status: SaleStatus,
    items: Vec<SaleItem>,
    total: Decimal,
    payment: Option<Payment>,
    version: u64,
    created: bool,
}

impl Sale {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: SaleId) -> Self {
        Self {
            id,
            tenant_id: None,
            warehouse_id: None,
            point_of_sale: None,
            status: SaleStatus::Pending,
            items: Vec::new(),
            total: Decimal::ZERO,
            payment: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> SaleId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn warehouse_id(&self) -> Option<WarehouseId> {
        self.warehouse_id
    }

    pub fn point_of_sale(&self) -> Option<PointOfSaleId> {
        self.point_of_sale
    }

    pub fn status(&self) -> SaleStatus {
        self.status
    }

    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn payment(&self) -> Option<Payment> {
        self.payment
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Quantity of `product_id` already on the sale, across all lines.
    pub fn quantity_of(&self, product_id: ProductId) -> Quantity {
        self.items
            .iter()
            .filter(|i| i.product_id == product_id)
            .map(|i| i.quantity)
            .fold(0, Quantity::saturating_add)
    }
}

impl AggregateRoot for Sale {
    type Id = SaleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaleCommand {
    Create {
        tenant_id: TenantId,
        sale_id: SaleId,
        warehouse_id: WarehouseId,
        point_of_sale: Option<PointOfSaleId>,
        occurred_at: DateTime<Utc>,
    },
    /// `unit_price` is already resolved (explicit or catalog sale price).
    AddItem {
        tenant_id: TenantId,
        product_id: ProductId,
        quantity: Quantity,
        unit_price: Decimal,
        occurred_at: DateTime<Utc>,
    },
    Complete {
        tenant_id: TenantId,
        method: PaymentMethod,
        amount_paid: Decimal,
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
pub enum SaleEvent {
    SaleCreated {
        tenant_id: TenantId,
        sale_id: SaleId,
        warehouse_id: WarehouseId,
        point_of_sale: Option<PointOfSaleId>,
        occurred_at: DateTime<Utc>,
    },
    SaleItemAdded {
        tenant_id: TenantId,
        sale_id: SaleId,
        item: SaleItem,
        /// Sale total after this item.
        total: Decimal,
        occurred_at: DateTime<Utc>,
    },
    SaleCompleted {
        tenant_id: TenantId,
        sale_id: SaleId,
        total: Decimal,
        payment: Payment,
        occurred_at: DateTime<Utc>,
    },
    SaleCancelled {
        tenant_id: TenantId,
        sale_id: SaleId,
        reason: Option<String>,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for SaleEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SaleEvent::SaleCreated { .. } => "sales.sale.created",
            SaleEvent::SaleItemAdded { .. } => "sales.sale.item_added",
            SaleEvent::SaleCompleted { .. } => "sales.sale.completed",
            SaleEvent::SaleCancelled { .. } => "sales.sale.cancelled",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SaleEvent::SaleCreated { occurred_at, .. }
            | SaleEvent::SaleItemAdded { occurred_at, .. }
            | SaleEvent::SaleCompleted { occurred_at, .. }
            | SaleEvent::SaleCancelled { occurred_at, .. } => *occurred_at,
        }
    }
}

impl Aggregate for Sale {
    type Command = SaleCommand;
    type Event = SaleEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SaleEvent::SaleCreated {
                tenant_id,
                sale_id,
                warehouse_id,
                point_of_sale,
                ..
            } => {
                self.id = *sale_id;
                self.tenant_id = Some(*tenant_id);
                self.warehouse_id = Some(*warehouse_id);
                self.point_of_sale = *point_of_sale;
                self.status = SaleStatus::Pending;
                self.items.clear();
                self.total = Decimal::ZERO;
                self.created = true;
            }
            SaleEvent::SaleItemAdded { item, .. } => {
                self.items.push(item.clone());
                self.total = self.items.iter().map(|i| i.line_total).sum();
            }
            SaleEvent::SaleCompleted { payment, .. } => {
                self.status = SaleStatus::Completed;
                self.payment = Some(*payment);
            }
            SaleEvent::SaleCancelled { .. } => {
                self.status = SaleStatus::Cancelled;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SaleCommand::Create {
                tenant_id,
                sale_id,
                warehouse_id,
                point_of_sale,
                occurred_at,
            } => {
                if self.created {
                    return Err(DomainError::conflict("sale already exists"));
                }
                Ok(vec![SaleEvent::SaleCreated {
                    tenant_id: *tenant_id,
                    sale_id: *sale_id,
                    warehouse_id: *warehouse_id,
                    point_of_sale: *point_of_sale,
                    occurred_at: *occurred_at,
                }])
            }
            SaleCommand::AddItem {
                tenant_id,
                product_id,
                quantity,
                unit_price,
                occurred_at,
            } => {
                self.ensure_created(*tenant_id)?;
                if self.status != SaleStatus::Pending {
                    return Err(DomainError::locked("sale", self.status));
                }
                if *quantity <= 0 {
                    return Err(DomainError::invalid_quantity(format!(
                        "sale item quantity must be positive (got {quantity})"
                    )));
                }
                if *unit_price < Decimal::ZERO {
                    return Err(DomainError::validation("unit price cannot be negative"));
                }
                let line_total = Decimal::from(*quantity)
                    .checked_mul(*unit_price)
                    .and_then(|line| self.total.checked_add(line).map(|_| line))
                    .ok_or_else(|| DomainError::invalid_quantity("sale total overflows"))?;
                Ok(vec![SaleEvent::SaleItemAdded {
                    tenant_id: *tenant_id,
                    sale_id: self.id,
                    item: SaleItem {
                        line_no: self.items.len() as u32 + 1,
                        product_id: *product_id,
                        quantity: *quantity,
                        unit_price: *unit_price,
                        line_total,
                    },
                    total: self.total + line_total,
                    occurred_at: *occurred_at,
                }])
            }
            SaleCommand::Complete {
                tenant_id,
                method,
                amount_paid,
                occurred_at,
            } => {
                self.ensure_created(*tenant_id)?;
                if self.status != SaleStatus::Pending {
                    return Err(DomainError::invalid_transition("sale", "complete", self.status));
                }
                if self.items.is_empty() {
                    return Err(DomainError::EmptyDocument("sale"));
                }
                if *amount_paid < Decimal::ZERO {
                    return Err(DomainError::validation("amount paid cannot be negative"));
                }
                if method.requires_cash_ledger_entry() && self.point_of_sale.is_none() {
                    return Err(DomainError::validation(
                        "a cash sale must be rung up on a point of sale",
                    ));
                }
                Ok(vec![SaleEvent::SaleCompleted {
                    tenant_id: *tenant_id,
                    sale_id: self.id,
                    total: self.total,
                    payment: Payment::settle(*method, *amount_paid, self.total),
                    occurred_at: *occurred_at,
                }])
            }
            SaleCommand::Cancel {
                tenant_id,
                reason,
                occurred_at,
            } => {
                self.ensure_created(*tenant_id)?;
                if self.status != SaleStatus::Pending {
                    return Err(DomainError::invalid_transition("sale", "cancel", self.status));
                }
                Ok(vec![SaleEvent::SaleCancelled {
                    tenant_id: *tenant_id,
                    sale_id: self.id,
                    reason: reason.clone(),
                    occurred_at: *occurred_at,
                }])
            }
        }
    }
}

impl Sale {
    fn ensure_created(&self, tenant_id: TenantId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("sale {}", self.id)));
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        Ok(())
    }
}
