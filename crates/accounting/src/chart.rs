use serde::{Deserialize, Serialize};

use comptoir_core::{PaymentMethod, Settlement};

/// Account identifier in the tenant's chart (e.g. `"1300"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountCode(String);

impl AccountCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountCode {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl core::fmt::Display for AccountCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operating expense categories paid out of a cash register.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Personnel,
    Transport,
    Utilities,
    Maintenance,
    Rent,
    Insurance,
    Other,
}

/// Expense account per [`ExpenseCategory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpenseAccounts {
    pub personnel: AccountCode,
    pub transport: AccountCode,
    pub utilities: AccountCode,
    pub maintenance: AccountCode,
    pub rent: AccountCode,
    pub insurance: AccountCode,
    pub other: AccountCode,
}

impl Default for ExpenseAccounts {
    fn default() -> Self {
        Self {
            personnel: "6100".into(),
            transport: "6200".into(),
            utilities: "6300".into(),
            maintenance: "6400".into(),
            rent: "6500".into(),
            insurance: "6600".into(),
            other: "6900".into(),
        }
    }
}

/// Account codes the posting generator writes to.
///
/// Supplied per tenant by configuration; `Default` is the standard chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartOfAccounts {
    pub inventory: AccountCode,
    pub payables: AccountCode,
    pub cash: AccountCode,
    pub bank: AccountCode,
    pub card: AccountCode,
    pub mobile_money: AccountCode,
    pub receivable: AccountCode,
    pub revenue: AccountCode,
    pub cost_of_goods_sold: AccountCode,
    pub inventory_gain: AccountCode,
    pub shrinkage: AccountCode,
    pub rounding: AccountCode,
    pub expenses: ExpenseAccounts,
}

impl Default for ChartOfAccounts {
    fn default() -> Self {
        Self {
            inventory: "1300".into(),
            payables: "2100".into(),
            cash: "1100".into(),
            bank: "1110".into(),
            card: "1200".into(),
            mobile_money: "1250".into(),
            receivable: "4110".into(),
            revenue: "4000".into(),
            cost_of_goods_sold: "5000".into(),
            inventory_gain: "8100".into(),
            shrinkage: "8200".into(),
            rounding: "6580".into(),
            expenses: ExpenseAccounts::default(),
        }
    }
}

impl ChartOfAccounts {
    /// Account debited when a sale is collected with `method`.
    pub fn collection_account(&self, method: PaymentMethod) -> &AccountCode {
        match method {
            PaymentMethod::Cash => &self.cash,
            PaymentMethod::Card => &self.card,
            PaymentMethod::MobileMoney => &self.mobile_money,
            PaymentMethod::BankTransfer => &self.bank,
            PaymentMethod::OnAccount => &self.receivable,
        }
    }

    /// Account credited when a purchase is received under `settlement`.
    pub fn settlement_account(&self, settlement: Settlement) -> &AccountCode {
        match settlement {
            Settlement::OnAccount | Settlement::Paid(PaymentMethod::OnAccount) => &self.payables,
            Settlement::Paid(method) => self.collection_account(method),
        }
    }

    pub fn expense_account(&self, category: ExpenseCategory) -> &AccountCode {
        let e = &self.expenses;
        match category {
            ExpenseCategory::Personnel => &e.personnel,
            ExpenseCategory::Transport => &e.transport,
            ExpenseCategory::Utilities => &e.utilities,
            ExpenseCategory::Maintenance => &e.maintenance,
            ExpenseCategory::Rent => &e.rent,
            ExpenseCategory::Insurance => &e.insurance,
            ExpenseCategory::Other => &e.other,
        }
    }
}
