//! Capability-check port consumed by every work-order service.

use crate::access::domain::{Actor, Capability, RoleName};

/// Authorization contract supplied by the identity provider.
///
/// Lookups are expected to be cheap and infallible; an unknown actor simply
/// holds no roles and no capabilities.
#[cfg_attr(test, mockall::automock)]
pub trait CapabilityProvider: Send + Sync {
    /// Returns `true` when the actor holds the capability, either directly
    /// or through one of its roles.
    fn actor_has_capability(&self, actor: &Actor, capability: Capability) -> bool;

    /// Returns `true` when the actor is a member of the named role.
    fn is_in_role(&self, actor: &Actor, role: &RoleName) -> bool;
}
