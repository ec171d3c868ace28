use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "sales.create"). The wildcard `"*"`
/// grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const WILDCARD: Permission = Permission(Cow::Borrowed("*"));

    pub const PURCHASES_MANAGE: Permission = Permission(Cow::Borrowed("purchases.manage"));
    pub const PURCHASES_RECEIVE: Permission = Permission(Cow::Borrowed("purchases.receive"));
    pub const SALES_CREATE: Permission = Permission(Cow::Borrowed("sales.create"));
    pub const SALES_COMPLETE: Permission = Permission(Cow::Borrowed("sales.complete"));
    pub const SALES_CANCEL: Permission = Permission(Cow::Borrowed("sales.cancel"));
    pub const TRANSFERS_MANAGE: Permission = Permission(Cow::Borrowed("transfers.manage"));
    pub const TRANSFERS_APPROVE: Permission = Permission(Cow::Borrowed("transfers.approve"));
    pub const INVENTORY_COUNT: Permission = Permission(Cow::Borrowed("inventory.count"));
    pub const CASH_OPERATE: Permission = Permission(Cow::Borrowed("cash.operate"));
    pub const ACCOUNTING_READ: Permission = Permission(Cow::Borrowed("accounting.read"));
    pub const ACCOUNTING_RECONCILE: Permission = Permission(Cow::Borrowed("accounting.reconcile"));
    pub const LEDGER_READ: Permission = Permission(Cow::Borrowed("ledger.read"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
