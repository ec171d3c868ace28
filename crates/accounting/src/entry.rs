use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use comptoir_core::{DocumentRef, TenantId};

use crate::chart::AccountCode;

/// One side of a posting, before it is persisted.
///
/// Exactly one of `debit` / `credit` is non-zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account: AccountCode,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl JournalLine {
    pub fn debit(account: &AccountCode, amount: Decimal) -> Self {
        Self {
            account: account.clone(),
            debit: amount,
            credit: Decimal::ZERO,
        }
    }

    pub fn credit(account: &AccountCode, amount: Decimal) -> Self {
        Self {
            account: account.clone(),
            debit: Decimal::ZERO,
            credit: amount,
        }
    }

    /// `debit − credit`.
    pub fn net(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// Immutable general-ledger line (append-only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingEntry {
    /// Per-tenant, auto-incrementing.
    pub id: u64,
    /// Lines sharing a posting id form one balanced set.
    pub posting_id: u64,
    pub tenant_id: TenantId,
    pub account: AccountCode,
    pub debit: Decimal,
    pub credit: Decimal,
    pub date: NaiveDate,
    pub source: DocumentRef,
    pub description: String,
    /// Bank-reconciled flag; the only field that changes after posting.
    pub rapproche: bool,
    pub posted_at: DateTime<Utc>,
}

impl AccountingEntry {
    pub fn net(&self) -> Decimal {
        self.debit - self.credit
    }
}
