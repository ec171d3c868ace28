//! `comptoir-auth`: authorization boundary consumed by the workflow engine.
//!
//! Authentication and token handling live outside this workspace; callers hand
//! the engine an already-resolved [`Principal`].

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{Authorizer, AuthzError, RolePolicy, authorize};
pub use permissions::Permission;
pub use principal::{Principal, TenantMembership};
pub use roles::Role;
