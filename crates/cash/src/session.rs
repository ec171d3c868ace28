use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use comptoir_core::{Aggregate, AggregateRoot, DomainError, PointOfSaleId, TenantId, UserId};
use comptoir_events::Event;

use crate::movement::SessionTotals;

comptoir_core::document_id!(
    /// Cash register session identifier.
    SessionId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Open,
    Closed,
}

/// Aggregate root: CashSession.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashSession {
    id: SessionId,
    tenant_id: Option<TenantId>,
    point_of_sale: Option<PointOfSaleId>,
    opened_by: Option<UserId>,
    opening_balance: Decimal,
    status: SessionStatus,
    counted_balance: Option<Decimal>,
    expected_balance: Option<Decimal>,
    version: u64,
    created: bool,
}

impl CashSession {
    pub fn empty(id: SessionId) -> Self {
        Self {
            id,
            tenant_id: None,
            point_of_sale: None,
            opened_by: None,
            opening_balance: Decimal::ZERO,
            status: SessionStatus::Open,
            counted_balance: None,
            expected_balance: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> SessionId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn point_of_sale(&self) -> Option<PointOfSaleId> {
        self.point_of_sale
    }

    pub fn opened_by(&self) -> Option<UserId> {
        self.opened_by
    }

    pub fn opening_balance(&self) -> Decimal {
        self.opening_balance
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn is_open(&self) -> bool {
        self.created && self.status == SessionStatus::Open
    }

    pub fn summary(&self, totals: SessionTotals) -> SessionSummary {
        SessionSummary {
            session_id: self.id,
            point_of_sale: self.point_of_sale,
            status: self.status,
            opening_balance: self.opening_balance,
            total_in: totals.total_in,
            total_out: totals.total_out,
            expected_balance: totals.expected_balance(self.opening_balance),
            movement_count: totals.movement_count,
            counted_balance: self.counted_balance,
            difference: self
                .counted_balance
                .zip(self.expected_balance)
                .map(|(counted, expected)| counted - expected),
        }
    }
}

impl AggregateRoot for CashSession {
    type Id = SessionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub point_of_sale: Option<PointOfSaleId>,
    pub status: SessionStatus,
    pub opening_balance: Decimal,
    pub total_in: Decimal,
    pub total_out: Decimal,
    pub expected_balance: Decimal,
    pub movement_count: usize,
    pub counted_balance: Option<Decimal>,
    /// `counted − expected`, once closed.
    pub difference: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionCommand {
    Open {
        tenant_id: TenantId,
        session_id: SessionId,
        point_of_sale: PointOfSaleId,
        opening_balance: Decimal,
        opened_by: UserId,
        occurred_at: DateTime<Utc>,
    },
    /// `totals` are folded from the session's movements inside the closing transaction.
    Close {
        tenant_id: TenantId,
        counted_balance: Decimal,
        totals: SessionTotals,
        closed_by: UserId,
        occurred_at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    SessionOpened {
        tenant_id: TenantId,
        session_id: SessionId,
        point_of_sale: PointOfSaleId,
        opening_balance: Decimal,
        opened_by: UserId,
        occurred_at: DateTime<Utc>,
    },
    SessionClosed {
        tenant_id: TenantId,
        session_id: SessionId,
        expected_balance: Decimal,
        counted_balance: Decimal,
        difference: Decimal,
        closed_by: UserId,
        occurred_at: DateTime<Utc>,
    },
}

impl Event for SessionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::SessionOpened { .. } => "cash.session.opened",
            SessionEvent::SessionClosed { .. } => "cash.session.closed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            SessionEvent::SessionOpened { occurred_at, .. }
            | SessionEvent::SessionClosed { occurred_at, .. } => *occurred_at,
        }
    }
}

impl Aggregate for CashSession {
    type Command = SessionCommand;
    type Event = SessionEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            SessionEvent::SessionOpened {
                tenant_id,
                session_id,
                point_of_sale,
                opening_balance,
                opened_by,
                ..
            } => {
                self.id = *session_id;
                self.tenant_id = Some(*tenant_id);
                self.point_of_sale = Some(*point_of_sale);
                self.opening_balance = *opening_balance;
                self.opened_by = Some(*opened_by);
                self.status = SessionStatus::Open;
                self.created = true;
            }
            SessionEvent::SessionClosed {
                expected_balance,
                counted_balance,
                ..
            } => {
                self.status = SessionStatus::Closed;
                self.expected_balance = Some(*expected_balance);
                self.counted_balance = Some(*counted_balance);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            SessionCommand::Open {
                tenant_id,
                session_id,
                point_of_sale,
                opening_balance,
                opened_by,
                occurred_at,
            } => {
                if self.created {
                    return Err(DomainError::conflict("cash session already exists"));
                }
                if *opening_balance < Decimal::ZERO {
                    return Err(DomainError::validation("opening balance cannot be negative"));
                }
                Ok(vec![SessionEvent::SessionOpened {
                    tenant_id: *tenant_id,
                    session_id: *session_id,
                    point_of_sale: *point_of_sale,
                    opening_balance: *opening_balance,
                    opened_by: *opened_by,
                    occurred_at: *occurred_at,
                }])
            }
            SessionCommand::Close {
                tenant_id,
                counted_balance,
                totals,
                closed_by,
                occurred_at,
            } => {
                if !self.created {
                    return Err(DomainError::not_found(format!("cash session {}", self.id)));
                }
                if self.tenant_id != Some(*tenant_id) {
                    return Err(DomainError::invariant("tenant mismatch"));
                }
                if self.status != SessionStatus::Open {
                    return Err(DomainError::invalid_transition("cash session", "close", self.status));
                }
                if *counted_balance < Decimal::ZERO {
                    return Err(DomainError::validation("counted balance cannot be negative"));
                }
                let expected_balance = totals.expected_balance(self.opening_balance);
                Ok(vec![SessionEvent::SessionClosed {
                    tenant_id: *tenant_id,
                    session_id: self.id,
                    expected_balance,
                    counted_balance: *counted_balance,
                    difference: *counted_balance - expected_balance,
                    closed_by: *closed_by,
                    occurred_at: *occurred_at,
                }])
            }
        }
    }
}
