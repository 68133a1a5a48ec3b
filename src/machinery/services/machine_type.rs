//! Service layer for the machine-type catalogue.

use crate::machinery::{
    domain::{MachineDomainError, MachineType, MachineTypeId},
    ports::{MachineTypeRepository, MachineTypeRepositoryError},
};
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for machine-type operations.
#[derive(Debug, Error)]
pub enum MachineTypeServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] MachineDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] MachineTypeRepositoryError),
}

/// Result type for machine-type operations.
pub type MachineTypeServiceResult<T> = Result<T, MachineTypeServiceError>;

/// Machine-type catalogue service.
#[derive(Clone)]
pub struct MachineTypeService<R>
where
    R: MachineTypeRepository,
{
    repository: Arc<R>,
}

impl<R> MachineTypeService<R>
where
    R: MachineTypeRepository,
{
    /// Creates a new machine-type service.
    #[must_use]
    pub const fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Creates an active machine type.
    ///
    /// # Errors
    ///
    /// Returns [`MachineTypeServiceError`] when the name is blank or taken.
    pub async fn create(&self, name: &str) -> MachineTypeServiceResult<MachineType> {
        let machine_type = MachineType::new(name)?;
        self.repository.store(&machine_type).await?;
        Ok(machine_type)
    }

    /// Activates or deactivates a machine type.
    ///
    /// # Errors
    ///
    /// Returns [`MachineTypeServiceError::Repository`] when the type does not
    /// exist or the write fails.
    pub async fn set_active(
        &self,
        id: MachineTypeId,
        active: bool,
    ) -> MachineTypeServiceResult<MachineType> {
        let mut machine_type = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(MachineTypeRepositoryError::NotFound(id))?;
        machine_type.set_active(active);
        self.repository.update(&machine_type).await?;
        Ok(machine_type)
    }

    /// Lists active machine types ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`MachineTypeServiceError::Repository`] when the query fails.
    pub async fn list_active(&self) -> MachineTypeServiceResult<Vec<MachineType>> {
        Ok(self.repository.list_active().await?)
    }
}
