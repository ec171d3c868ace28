use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use comptoir_core::{DocumentRef, DomainError, DomainResult, PointOfSaleId, TenantId};

use crate::session::SessionId;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CashDirection {
    In,
    Out,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CashCategory {
    Sale,
    Purchase,
    Expense,
    Deposit,
    Withdrawal,
    Adjustment,
}

impl CashCategory {
    pub fn permits(self, direction: CashDirection) -> bool {
        match self {
            CashCategory::Sale | CashCategory::Deposit => direction == CashDirection::In,
            CashCategory::Purchase | CashCategory::Expense | CashCategory::Withdrawal => {
                direction == CashDirection::Out
            }
            CashCategory::Adjustment => true,
        }
    }
}

/// A cash movement as requested, before the store assigns id, session and time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashMovementRequest {
    pub direction: CashDirection,
    pub category: CashCategory,
    pub amount: Decimal,
    pub document: Option<DocumentRef>,
    pub description: String,
}

impl CashMovementRequest {
    pub fn new(direction: CashDirection, category: CashCategory, amount: Decimal, description: impl Into<String>) -> Self {
        Self {
            direction,
            category,
            amount,
            document: None,
            description: description.into(),
        }
    }

    pub fn for_document(mut self, document: DocumentRef) -> Self {
        self.document = Some(document);
        self
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.amount <= Decimal::ZERO {
            return Err(DomainError::validation(format!(
                "cash movement amount must be positive (got {})",
                self.amount
            )));
        }
        if !self.category.permits(self.direction) {
            return Err(DomainError::validation(format!(
                "{:?} cash movement cannot be {:?}",
                self.category, self.direction
            )));
        }
        Ok(())
    }
}

/// Immutable cash register movement (append-only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashMovement {
    /// Per-tenant, auto-incrementing.
    pub id: u64,
    pub tenant_id: TenantId,
    pub session_id: SessionId,
    pub point_of_sale: PointOfSaleId,
    pub direction: CashDirection,
    pub category: CashCategory,
    pub amount: Decimal,
    pub document: Option<DocumentRef>,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

impl CashMovement {
    /// `+amount` for `In`, `-amount` for `Out`.
    pub fn signed_amount(&self) -> Decimal {
        match self.direction {
            CashDirection::In => self.amount,
            CashDirection::Out => -self.amount,
        }
    }
}

/// Movement totals of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionTotals {
    pub total_in: Decimal,
    pub total_out: Decimal,
    pub movement_count: usize,
}

impl SessionTotals {
    pub fn from_movements<'a, I>(movements: I) -> Self
    where
        I: IntoIterator<Item = &'a CashMovement>,
    {
        movements.into_iter().fold(Self::default(), |mut t, m| {
            match m.direction {
                CashDirection::In => t.total_in += m.amount,
                CashDirection::Out => t.total_out += m.amount,
            }
            t.movement_count += 1;
            t
        })
    }

    /// `opening + Σin − Σout`.
    pub fn expected_balance(&self, opening_balance: Decimal) -> Decimal {
        opening_balance + self.total_in - self.total_out
    }
}
