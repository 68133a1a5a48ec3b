//! In-memory repository for machines.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::machinery::{
    domain::{Machine, MachineCode, MachineId, MachineState, PersistedMachineData},
    ports::{MachineFilter, MachineRepository, MachineRepositoryError, MachineRepositoryResult},
};

/// Thread-safe in-memory machine repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMachineRepository {
    state: Arc<RwLock<InMemoryMachineState>>,
}

#[derive(Debug, Default)]
struct InMemoryMachineState {
    machines: HashMap<MachineId, Machine>,
    code_index: HashMap<MachineCode, MachineId>,
}

impl InMemoryMachineRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> MachineRepositoryError {
    MachineRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl MachineRepository for InMemoryMachineRepository {
    async fn store(&self, machine: &Machine) -> MachineRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.machines.contains_key(&machine.id()) {
            return Err(MachineRepositoryError::DuplicateMachine(machine.id()));
        }
        if state.code_index.contains_key(machine.code()) {
            return Err(MachineRepositoryError::DuplicateCode(machine.code().clone()));
        }

        state.code_index.insert(machine.code().clone(), machine.id());
        state.machines.insert(machine.id(), machine.clone());
        Ok(())
    }

    async fn update(&self, machine: &Machine) -> MachineRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        let stored = state
            .machines
            .get(&machine.id())
            .ok_or(MachineRepositoryError::NotFound(machine.id()))?;
        let previous_code = stored.code().clone();
        let merged = Machine::from_persisted(PersistedMachineData {
            state: stored.state(),
            created_at: stored.created_at(),
            ..machine.to_persisted()
        });

        if previous_code != *machine.code() {
            if state.code_index.contains_key(machine.code()) {
                return Err(MachineRepositoryError::DuplicateCode(machine.code().clone()));
            }
            state.code_index.remove(&previous_code);
            state.code_index.insert(machine.code().clone(), machine.id());
        }
        state.machines.insert(machine.id(), merged);
        Ok(())
    }

    async fn update_state(
        &self,
        machine: &Machine,
        expected: MachineState,
    ) -> MachineRepositoryResult<bool> {
        let mut state = self.state.write().map_err(lock_error)?;
        let stored = state
            .machines
            .get(&machine.id())
            .ok_or(MachineRepositoryError::NotFound(machine.id()))?;
        if stored.state() != expected {
            return Ok(false);
        }
        let updated = Machine::from_persisted(PersistedMachineData {
            state: machine.state(),
            updated_at: machine.updated_at(),
            ..stored.to_persisted()
        });
        state.machines.insert(machine.id(), updated);
        Ok(true)
    }

    async fn find_by_id(&self, id: MachineId) -> MachineRepositoryResult<Option<Machine>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.machines.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &MachineCode) -> MachineRepositoryResult<Option<Machine>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state
            .code_index
            .get(code)
            .and_then(|id| state.machines.get(id))
            .cloned())
    }

    async fn list(&self, filter: &MachineFilter) -> MachineRepositoryResult<Vec<Machine>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut machines: Vec<Machine> = state
            .machines
            .values()
            .filter(|machine| filter.matches(machine))
            .cloned()
            .collect();
        machines.sort_by(|left, right| {
            left.name()
                .cmp(right.name())
                .then_with(|| left.code().cmp(right.code()))
        });
        Ok(machines)
    }
}
