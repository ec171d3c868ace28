use comptoir_auth::{Authorizer, AuthzError, Permission, Principal};
use comptoir_core::{TenantId, UserId};

use crate::error::{EngineError, EngineResult};

/// Caller identity and tenant, passed explicitly into every engine operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub tenant_id: TenantId,
    pub principal: Principal,
}

impl RequestContext {
    /// Context acting in the principal's active tenant.
    pub fn new(principal: Principal) -> Self {
        Self {
            tenant_id: principal.active_tenant_id,
            principal,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.principal.user_id
    }

    /// Checks the request tenant against the principal, then the permission.
    pub fn authorize(&self, authorizer: &dyn Authorizer, required: &Permission) -> EngineResult<()> {
        if self.principal.active_tenant_id != self.tenant_id {
            return Err(EngineError::Authz(AuthzError::TenantMismatch));
        }
        authorizer.authorize(&self.principal, required)?;
        Ok(())
    }
}
