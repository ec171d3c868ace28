use serde::{Deserialize, Serialize};

use comptoir_core::{TenantId, UserId};

use crate::{Permission, Role};

/// A principal's membership in a tenant.
///
/// States *which tenant* the principal acts within and which roles/permissions
/// are granted there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantMembership {
    pub tenant_id: TenantId,
    pub roles: Vec<Role>,
    /// Permissions granted directly, on top of those implied by roles.
    pub permissions: Vec<Permission>,
}

/// A fully resolved caller identity for authorization decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub active_tenant_id: TenantId,
    pub membership: TenantMembership,
}

impl Principal {
    /// Principal acting in its own tenant with the given roles.
    pub fn with_roles(user_id: UserId, tenant_id: TenantId, roles: Vec<Role>) -> Self {
        Self {
            user_id,
            active_tenant_id: tenant_id,
            membership: TenantMembership {
                tenant_id,
                roles,
                permissions: Vec::new(),
            },
        }
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.membership.roles.contains(role)
    }
}
