use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::chart::AccountCode;
use crate::entry::AccountingEntry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    pub account: AccountCode,
    pub debit: Decimal,
    pub credit: Decimal,
    /// `debit − credit`.
    pub balance: Decimal,
}

/// Per-account debit and credit totals over a set of entries.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrialBalance {
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
}

impl TrialBalance {
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a AccountingEntry>,
    {
        let mut totals: BTreeMap<AccountCode, (Decimal, Decimal)> = BTreeMap::new();
        for entry in entries {
            let t = totals.entry(entry.account.clone()).or_default();
            t.0 += entry.debit;
            t.1 += entry.credit;
        }

        let rows: Vec<TrialBalanceRow> = totals
            .into_iter()
            .map(|(account, (debit, credit))| TrialBalanceRow {
                account,
                debit,
                credit,
                balance: debit - credit,
            })
            .collect();
        let total_debit = rows.iter().map(|r| r.debit).sum();
        let total_credit = rows.iter().map(|r| r.credit).sum();
        Self {
            rows,
            total_debit,
            total_credit,
        }
    }

    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }

    pub fn balance_of(&self, account: &AccountCode) -> Decimal {
        self.rows
            .iter()
            .find(|r| &r.account == account)
            .map(|r| r.balance)
            .unwrap_or_default()
    }
}
