//! Payment methods as tagged variants.

use serde::{Deserialize, Serialize};

/// How a sale is collected or a purchase is paid.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    MobileMoney,
    BankTransfer,
    /// Deferred settlement: receivable for sales, payable for purchases.
    OnAccount,
}

impl PaymentMethod {
    /// Whether the payment moves physical cash through a register session.
    pub fn requires_cash_ledger_entry(self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::MobileMoney => "mobile_money",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::OnAccount => "on_account",
        }
    }
}

impl core::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement terms of a purchase.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "terms", content = "method", rename_all = "snake_case")]
pub enum Settlement {
    /// Supplier invoice to be paid later (credit accounts payable).
    OnAccount,
    /// Paid at receipt with the given method.
    Paid(PaymentMethod),
}

impl Settlement {
    pub fn requires_cash_ledger_entry(self) -> bool {
        match self {
            Settlement::OnAccount => false,
            Settlement::Paid(method) => method.requires_cash_ledger_entry(),
        }
    }
}
