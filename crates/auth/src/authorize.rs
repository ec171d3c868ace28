use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::{Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("tenant mismatch")]
    TenantMismatch,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorization check consumed by the workflow engine before every transition.
pub trait Authorizer: Send + Sync {
    fn authorize(&self, principal: &Principal, required: &Permission) -> Result<(), AuthzError>;
}

/// Authorize a principal using only its explicitly granted permissions.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.active_tenant_id != principal.membership.tenant_id {
        return Err(AuthzError::TenantMismatch);
    }

    let perms: HashSet<&str> = principal
        .membership
        .permissions
        .iter()
        .map(|p| p.as_str())
        .collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Role → permission mapping.
#[derive(Debug, Clone, Default)]
pub struct RolePolicy {
    grants: HashMap<String, Vec<Permission>>,
}

impl RolePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, role: Role, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.grants
            .entry(role.as_str().to_string())
            .or_default()
            .extend(permissions);
        self
    }

    /// Back-office defaults. Only cashiers and servers may open sales.
    pub fn standard() -> Self {
        let selling = [
            Permission::SALES_CREATE,
            Permission::SALES_COMPLETE,
            Permission::SALES_CANCEL,
            Permission::CASH_OPERATE,
            Permission::LEDGER_READ,
        ];
        Self::new()
            .grant(Role::ADMIN, [Permission::WILDCARD])
            .grant(
                Role::MANAGER,
                [
                    Permission::PURCHASES_MANAGE,
                    Permission::PURCHASES_RECEIVE,
                    Permission::SALES_CANCEL,
                    Permission::TRANSFERS_MANAGE,
                    Permission::TRANSFERS_APPROVE,
                    Permission::INVENTORY_COUNT,
                    Permission::CASH_OPERATE,
                    Permission::ACCOUNTING_READ,
                    Permission::ACCOUNTING_RECONCILE,
                    Permission::LEDGER_READ,
                ],
            )
            .grant(Role::CASHIER, selling.clone())
            .grant(Role::SERVER, selling)
            .grant(
                Role::STOREKEEPER,
                [
                    Permission::PURCHASES_RECEIVE,
                    Permission::TRANSFERS_MANAGE,
                    Permission::INVENTORY_COUNT,
                    Permission::LEDGER_READ,
                ],
            )
    }

    fn permissions_of<'a>(&'a self, principal: &'a Principal) -> impl Iterator<Item = &'a Permission> {
        principal
            .membership
            .roles
            .iter()
            .filter_map(|role| self.grants.get(role.as_str()))
            .flatten()
            .chain(principal.membership.permissions.iter())
    }
}

impl Authorizer for RolePolicy {
    fn authorize(&self, principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
        if principal.active_tenant_id != principal.membership.tenant_id {
            return Err(AuthzError::TenantMismatch);
        }

        let granted = self
            .permissions_of(principal)
            .any(|p| p.is_wildcard() || p == required);

        if granted {
            Ok(())
        } else {
            Err(AuthzError::Forbidden(required.as_str().to_string()))
        }
    }
}
