//! In-memory repository for machine types.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::machinery::{
    domain::{MachineType, MachineTypeId},
    ports::{MachineTypeRepository, MachineTypeRepositoryError, MachineTypeRepositoryResult},
};

/// Thread-safe in-memory machine-type repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMachineTypeRepository {
    types: Arc<RwLock<HashMap<MachineTypeId, MachineType>>>,
}

impl InMemoryMachineTypeRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> MachineTypeRepositoryError {
    MachineTypeRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

fn name_taken(
    types: &HashMap<MachineTypeId, MachineType>,
    candidate: &MachineType,
) -> bool {
    types.values().any(|existing| {
        existing.id() != candidate.id() && existing.name().eq_ignore_ascii_case(candidate.name())
    })
}

#[async_trait]
impl MachineTypeRepository for InMemoryMachineTypeRepository {
    async fn store(&self, machine_type: &MachineType) -> MachineTypeRepositoryResult<()> {
        let mut types = self.types.write().map_err(lock_error)?;
        if name_taken(&types, machine_type) {
            return Err(MachineTypeRepositoryError::DuplicateName(
                machine_type.name().to_owned(),
            ));
        }
        types.insert(machine_type.id(), machine_type.clone());
        Ok(())
    }

    async fn update(&self, machine_type: &MachineType) -> MachineTypeRepositoryResult<()> {
        let mut types = self.types.write().map_err(lock_error)?;
        if !types.contains_key(&machine_type.id()) {
            return Err(MachineTypeRepositoryError::NotFound(machine_type.id()));
        }
        if name_taken(&types, machine_type) {
            return Err(MachineTypeRepositoryError::DuplicateName(
                machine_type.name().to_owned(),
            ));
        }
        types.insert(machine_type.id(), machine_type.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: MachineTypeId,
    ) -> MachineTypeRepositoryResult<Option<MachineType>> {
        let types = self.types.read().map_err(lock_error)?;
        Ok(types.get(&id).cloned())
    }

    async fn list_active(&self) -> MachineTypeRepositoryResult<Vec<MachineType>> {
        let types = self.types.read().map_err(lock_error)?;
        let mut active: Vec<MachineType> =
            types.values().filter(|t| t.is_active()).cloned().collect();
        active.sort_by(|left, right| left.name().cmp(right.name()));
        Ok(active)
    }
}
