//! Role → capability directory held in memory.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::error;

use crate::access::{
    domain::{Actor, Capability, RoleName, UserId},
    ports::CapabilityProvider,
};

/// Thread-safe directory of roles, role capabilities and direct grants.
///
/// A poisoned lock denies every check and fails every change.
#[derive(Debug, Clone, Default)]
pub struct RoleDirectory {
    state: Arc<RwLock<DirectoryState>>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    role_capabilities: HashMap<RoleName, BTreeSet<Capability>>,
    memberships: HashMap<UserId, BTreeSet<RoleName>>,
    direct_grants: HashMap<UserId, BTreeSet<Capability>>,
}

impl RoleDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory seeded with the operator, supervisor and
    /// area-manager roles.
    #[must_use]
    pub fn with_default_roles() -> Self {
        let role_capabilities = [
            (
                RoleName::operator(),
                vec![
                    Capability::CreateOdt,
                    Capability::SendRequest,
                    Capability::ExecuteOdt,
                    Capability::ViewDetail,
                ],
            ),
            (
                RoleName::supervisor(),
                vec![
                    Capability::ReviewOdt,
                    Capability::AuthorizeOdt,
                    Capability::ViewDetail,
                ],
            ),
            (
                RoleName::area_manager(),
                vec![
                    Capability::ApproveOdt,
                    Capability::AuthorizeOdt,
                    Capability::EditFullOdt,
                    Capability::ViewDetail,
                    Capability::ViewStats,
                ],
            ),
        ]
        .into_iter()
        .map(|(role, capabilities)| (role, capabilities.into_iter().collect()))
        .collect();
        Self {
            state: Arc::new(RwLock::new(DirectoryState {
                role_capabilities,
                ..DirectoryState::default()
            })),
        }
    }

    /// Defines (or redefines) the capabilities carried by a role.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryLockError`] when the directory lock is poisoned.
    pub fn define_role(
        &self,
        role: RoleName,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Result<(), DirectoryLockError> {
        let mut state = self.state.write().map_err(lock_error)?;
        state
            .role_capabilities
            .insert(role, capabilities.into_iter().collect());
        Ok(())
    }

    /// Adds a user to a role.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryLockError`] when the directory lock is poisoned.
    pub fn assign_role(&self, user: UserId, role: RoleName) -> Result<(), DirectoryLockError> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.memberships.entry(user).or_default().insert(role);
        Ok(())
    }

    /// Grants a capability directly to a user.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryLockError`] when the directory lock is poisoned.
    pub fn grant(&self, user: UserId, capability: Capability) -> Result<(), DirectoryLockError> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.direct_grants.entry(user).or_default().insert(capability);
        Ok(())
    }

    /// Removes a direct grant from a user.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryLockError`] when the directory lock is poisoned.
    pub fn revoke(&self, user: UserId, capability: Capability) -> Result<(), DirectoryLockError> {
        let mut state = self.state.write().map_err(lock_error)?;
        if let Some(grants) = state.direct_grants.get_mut(&user) {
            grants.remove(&capability);
        }
        Ok(())
    }
}

/// The directory lock was poisoned by a panicking writer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("role directory lock poisoned: {0}")]
pub struct DirectoryLockError(String);

fn lock_error(err: impl ToString) -> DirectoryLockError {
    let message = err.to_string();
    error!(error = %message, "role directory lock poisoned");
    DirectoryLockError(message)
}

impl CapabilityProvider for RoleDirectory {
    fn actor_has_capability(&self, actor: &Actor, capability: Capability) -> bool {
        let Ok(state) = self.state.read().map_err(lock_error) else {
            return false;
        };
        let user = actor.id();
        if state
            .direct_grants
            .get(&user)
            .is_some_and(|grants| grants.contains(&capability))
        {
            return true;
        }
        state.memberships.get(&user).is_some_and(|roles| {
            roles.iter().any(|role| {
                state
                    .role_capabilities
                    .get(role)
                    .is_some_and(|capabilities| capabilities.contains(&capability))
            })
        })
    }

    fn is_in_role(&self, actor: &Actor, role: &RoleName) -> bool {
        self.state.read().map_err(lock_error).is_ok_and(|state| {
            state
                .memberships
                .get(&actor.id())
                .is_some_and(|roles| roles.contains(role))
        })
    }
}
