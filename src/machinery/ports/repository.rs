//! Repository ports for machine and machine-type persistence.

use crate::machinery::domain::{
    Machine, MachineCode, MachineId, MachineState, MachineType, MachineTypeId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for machine repository operations.
pub type MachineRepositoryResult<T> = Result<T, MachineRepositoryError>;

/// Result type for machine-type repository operations.
pub type MachineTypeRepositoryResult<T> = Result<T, MachineTypeRepositoryError>;

/// Filter applied when listing machines. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineFilter {
    /// Only machines in this state.
    pub state: Option<MachineState>,
    /// Only machines of this type.
    pub machine_type: Option<MachineTypeId>,
    /// Only active (`true`) or inactive (`false`) machines.
    pub active: Option<bool>,
    /// Case-insensitive text contained in name, code or description.
    pub text: Option<String>,
}

impl MachineFilter {
    /// Returns `true` when the machine satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, machine: &Machine) -> bool {
        if self.state.is_some_and(|state| machine.state() != state) {
            return false;
        }
        if self
            .machine_type
            .is_some_and(|machine_type| machine.details().machine_type() != Some(machine_type))
        {
            return false;
        }
        if self.active.is_some_and(|active| machine.is_active() != active) {
            return false;
        }
        self.text.as_deref().is_none_or(|text| {
            let needle = text.trim().to_lowercase();
            [
                Some(machine.name()),
                Some(machine.code().as_str()),
                machine.details().description(),
            ]
            .into_iter()
            .flatten()
            .any(|haystack| haystack.to_lowercase().contains(&needle))
        })
    }
}

/// Machine persistence contract.
#[async_trait]
pub trait MachineRepository: Send + Sync {
    /// Stores a new machine.
    ///
    /// # Errors
    ///
    /// Returns [`MachineRepositoryError::DuplicateMachine`] when the ID
    /// exists or [`MachineRepositoryError::DuplicateCode`] when the code is
    /// already taken.
    async fn store(&self, machine: &Machine) -> MachineRepositoryResult<()>;

    /// Persists the descriptive fields and active flag of an existing
    /// machine. The stored operational state is never overwritten.
    ///
    /// # Errors
    ///
    /// Returns [`MachineRepositoryError::NotFound`] when the machine does not
    /// exist.
    async fn update(&self, machine: &Machine) -> MachineRepositoryResult<()>;

    /// Writes the operational state of `machine` only if the stored state
    /// is still `expected`.
    ///
    /// Returns `false` without writing when another writer changed the
    /// state first.
    ///
    /// # Errors
    ///
    /// Returns [`MachineRepositoryError::NotFound`] when the machine does not
    /// exist.
    async fn update_state(
        &self,
        machine: &Machine,
        expected: MachineState,
    ) -> MachineRepositoryResult<bool>;

    /// Finds a machine by identifier.
    async fn find_by_id(&self, id: MachineId) -> MachineRepositoryResult<Option<Machine>>;

    /// Finds a machine by its unique code.
    async fn find_by_code(&self, code: &MachineCode) -> MachineRepositoryResult<Option<Machine>>;

    /// Lists machines matching the filter, ordered by name then code.
    async fn list(&self, filter: &MachineFilter) -> MachineRepositoryResult<Vec<Machine>>;
}

/// Machine-type persistence contract.
#[async_trait]
pub trait MachineTypeRepository: Send + Sync {
    /// Stores a new machine type.
    ///
    /// # Errors
    ///
    /// Returns [`MachineTypeRepositoryError::DuplicateName`] when the name is
    /// already taken.
    async fn store(&self, machine_type: &MachineType) -> MachineTypeRepositoryResult<()>;

    /// Persists changes to an existing machine type.
    ///
    /// # Errors
    ///
    /// Returns [`MachineTypeRepositoryError::NotFound`] when the type does
    /// not exist.
    async fn update(&self, machine_type: &MachineType) -> MachineTypeRepositoryResult<()>;

    /// Finds a machine type by identifier.
    async fn find_by_id(&self, id: MachineTypeId)
    -> MachineTypeRepositoryResult<Option<MachineType>>;

    /// Lists active machine types ordered by name.
    async fn list_active(&self) -> MachineTypeRepositoryResult<Vec<MachineType>>;
}

/// Errors returned by machine repository implementations.
#[derive(Debug, Clone, Error)]
pub enum MachineRepositoryError {
    /// A machine with the same identifier already exists.
    #[error("duplicate machine identifier: {0}")]
    DuplicateMachine(MachineId),

    /// Another machine already uses the code.
    #[error("machine code already in use: {0}")]
    DuplicateCode(MachineCode),

    /// The machine was not found.
    #[error("machine not found: {0}")]
    NotFound(MachineId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl MachineRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}

/// Errors returned by machine-type repository implementations.
#[derive(Debug, Clone, Error)]
pub enum MachineTypeRepositoryError {
    /// Another machine type already uses the name.
    #[error("machine type name already in use: {0}")]
    DuplicateName(String),

    /// The machine type was not found.
    #[error("machine type not found: {0}")]
    NotFound(MachineTypeId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl MachineTypeRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
