//! Machine types ("lines of work") used to group machines and work orders.

use super::{MachineDomainError, MachineTypeId};
use serde::{Deserialize, Serialize};

/// A named machine type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineType {
    id: MachineTypeId,
    name: String,
    active: bool,
}

/// Parameter object for reconstructing a persisted machine type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMachineTypeData {
    /// Persisted identifier.
    pub id: MachineTypeId,
    /// Persisted unique name.
    pub name: String,
    /// Persisted active flag.
    pub active: bool,
}

impl MachineType {
    /// Creates a new, active machine type.
    ///
    /// # Errors
    ///
    /// Returns [`MachineDomainError::EmptyTypeName`] when the name is blank.
    pub fn new(name: impl AsRef<str>) -> Result<Self, MachineDomainError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(MachineDomainError::EmptyTypeName);
        }
        Ok(Self {
            id: MachineTypeId::new(),
            name: trimmed.to_owned(),
            active: true,
        })
    }

    /// Reconstructs a machine type from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedMachineTypeData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            active: data.active,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> MachineTypeId {
        self.id
    }

    /// Returns the unique name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` when the type is offered for new machines.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Marks the type active or inactive.
    pub const fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}
