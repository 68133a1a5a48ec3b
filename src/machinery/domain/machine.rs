//! Machine aggregate root.

use super::{
    MachineCode, MachineDomainError, MachineId, MachineState, MachineStateChange, MachineTypeId,
};
use crate::access::domain::UserId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Editable descriptive fields of a machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineDetails {
    name: String,
    description: Option<String>,
    responsible: Option<UserId>,
    machine_type: Option<MachineTypeId>,
}

impl MachineDetails {
    /// Creates validated machine details.
    ///
    /// # Errors
    ///
    /// Returns [`MachineDomainError::EmptyName`] when the name is blank.
    pub fn new(name: impl AsRef<str>) -> Result<Self, MachineDomainError> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(MachineDomainError::EmptyName);
        }
        Ok(Self {
            name: trimmed.to_owned(),
            description: None,
            responsible: None,
            machine_type: None,
        })
    }

    /// Sets the free-text description. Blank text clears it.
    #[must_use]
    pub fn with_description(mut self, description: impl AsRef<str>) -> Self {
        let trimmed = description.as_ref().trim();
        self.description = (!trimmed.is_empty()).then(|| trimmed.to_owned());
        self
    }

    /// Sets the person responsible for the machine.
    #[must_use]
    pub const fn with_responsible(mut self, responsible: UserId) -> Self {
        self.responsible = Some(responsible);
        self
    }

    /// Sets the machine type.
    #[must_use]
    pub const fn with_machine_type(mut self, machine_type: MachineTypeId) -> Self {
        self.machine_type = Some(machine_type);
        self
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the responsible person, if any.
    #[must_use]
    pub const fn responsible(&self) -> Option<UserId> {
        self.responsible
    }

    /// Returns the machine type, if any.
    #[must_use]
    pub const fn machine_type(&self) -> Option<MachineTypeId> {
        self.machine_type
    }
}

/// Machine aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    id: MachineId,
    code: MachineCode,
    details: MachineDetails,
    state: MachineState,
    active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedMachineData {
    /// Persisted machine identifier.
    pub id: MachineId,
    /// Persisted unique code.
    pub code: MachineCode,
    /// Persisted descriptive fields.
    pub details: MachineDetails,
    /// Persisted operational state.
    pub state: MachineState,
    /// Persisted active flag.
    pub active: bool,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Machine {
    /// Creates a new, active machine.
    #[must_use]
    pub fn new(
        code: MachineCode,
        details: MachineDetails,
        state: MachineState,
        clock: &impl Clock,
    ) -> Self {
        let timestamp = clock.utc();
        Self {
            id: MachineId::new(),
            code,
            details,
            state,
            active: true,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Reconstructs a machine from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedMachineData) -> Self {
        Self {
            id: data.id,
            code: data.code,
            details: data.details,
            state: data.state,
            active: data.active,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the fields needed to rebuild this machine from storage.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedMachineData {
        PersistedMachineData {
            id: self.id,
            code: self.code.clone(),
            details: self.details.clone(),
            state: self.state,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Returns the machine identifier.
    #[must_use]
    pub const fn id(&self) -> MachineId {
        self.id
    }

    /// Returns the unique machine code.
    #[must_use]
    pub const fn code(&self) -> &MachineCode {
        &self.code
    }

    /// Returns the descriptive fields.
    #[must_use]
    pub const fn details(&self) -> &MachineDetails {
        &self.details
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.details.name()
    }

    /// Returns the responsible person, if any.
    #[must_use]
    pub const fn responsible(&self) -> Option<UserId> {
        self.details.responsible
    }

    /// Returns the operational state.
    #[must_use]
    pub const fn state(&self) -> MachineState {
        self.state
    }

    /// Returns `true` when the machine is active.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Describes the creation of this machine as a state change from
    /// nothing.
    #[must_use]
    pub const fn initial_state_change(&self) -> MachineStateChange {
        MachineStateChange::new(self.id, None, self.state, self.created_at)
    }

    /// Moves the machine to a new operational state.
    ///
    /// Returns `None` and leaves the machine untouched when the state is
    /// unchanged.
    pub fn change_state(
        &mut self,
        state: MachineState,
        clock: &impl Clock,
    ) -> Option<MachineStateChange> {
        if self.state == state {
            return None;
        }
        let previous = self.state;
        self.state = state;
        self.touch(clock);
        Some(MachineStateChange::new(
            self.id,
            Some(previous),
            state,
            self.updated_at,
        ))
    }

    /// Replaces the descriptive fields.
    pub fn update_details(&mut self, details: MachineDetails, clock: &impl Clock) {
        self.details = details;
        self.touch(clock);
    }

    /// Marks the machine active or inactive.
    pub fn set_active(&mut self, active: bool, clock: &impl Clock) {
        if self.active != active {
            self.active = active;
            self.touch(clock);
        }
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
