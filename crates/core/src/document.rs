//! References from ledger records back to the document that produced them.

use serde::{Deserialize, Serialize};

use crate::id::AggregateId;

/// Business document types that can produce stock, cash or ledger records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Purchase,
    Sale,
    Transfer,
    InventoryCount,
    CashSession,
    Expense,
}

impl DocumentKind {
    /// Stream type name used when persisting the document's events.
    pub fn aggregate_type(self) -> &'static str {
        match self {
            DocumentKind::Purchase => "purchasing.purchase",
            DocumentKind::Sale => "sales.sale",
            DocumentKind::Transfer => "transfers.transfer",
            DocumentKind::InventoryCount => "reconciliation.count",
            DocumentKind::CashSession => "cash.session",
            DocumentKind::Expense => "cash.expense",
        }
    }

    /// Short prefix used in human-readable references (e.g. `PUR-…`).
    pub fn prefix(self) -> &'static str {
        match self {
            DocumentKind::Purchase => "PUR",
            DocumentKind::Sale => "SALE",
            DocumentKind::Transfer => "TRF",
            DocumentKind::InventoryCount => "INV",
            DocumentKind::CashSession => "CSH",
            DocumentKind::Expense => "EXP",
        }
    }
}

/// Link from a stock movement, cash movement or accounting entry to its source document.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub kind: DocumentKind,
    pub id: AggregateId,
}

impl DocumentRef {
    pub fn new(kind: DocumentKind, id: AggregateId) -> Self {
        Self { kind, id }
    }
}

impl core::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}-{}", self.kind.prefix(), self.id)
    }
}
