//! Service layer for machine registration and state changes.
//!
//! [`MachineRegistryService`] is the only writer of machine state. After each
//! committed state change it invokes the registered observers in order.

use crate::access::domain::UserId;
use crate::machinery::{
    domain::{
        Machine, MachineCode, MachineDetails, MachineDomainError, MachineId, MachineState,
        MachineStateChange, MachineTypeId,
    },
    ports::{MachineFilter, MachineRepository, MachineRepositoryError, MachineStateObserver},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

/// Request payload for registering a machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterMachineRequest {
    code: String,
    name: String,
    description: Option<String>,
    state: MachineState,
    responsible: Option<UserId>,
    machine_type: Option<MachineTypeId>,
}

impl RegisterMachineRequest {
    /// Creates a request for an operative machine.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            description: None,
            state: MachineState::Operative,
            responsible: None,
            machine_type: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the initial operational state.
    #[must_use]
    pub const fn with_state(mut self, state: MachineState) -> Self {
        self.state = state;
        self
    }

    /// Sets the responsible person.
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
}

/// Request payload for replacing a machine's descriptive fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateMachineRequest {
    name: String,
    description: Option<String>,
    responsible: Option<UserId>,
    machine_type: Option<MachineTypeId>,
}

impl UpdateMachineRequest {
    /// Creates an update carrying the new name and no optional fields.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            responsible: None,
            machine_type: None,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the responsible person.
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

    fn into_details(self) -> Result<MachineDetails, MachineDomainError> {
        build_details(
            &self.name,
            self.description,
            self.responsible,
            self.machine_type,
        )
    }
}

fn build_details(
    name: &str,
    description: Option<String>,
    responsible: Option<UserId>,
    machine_type: Option<MachineTypeId>,
) -> Result<MachineDetails, MachineDomainError> {
    let mut details = MachineDetails::new(name)?;
    if let Some(text) = description {
        details = details.with_description(text);
    }
    if let Some(user) = responsible {
        details = details.with_responsible(user);
    }
    if let Some(type_id) = machine_type {
        details = details.with_machine_type(type_id);
    }
    Ok(details)
}

/// Service-level errors for machine registry operations.
#[derive(Debug, Error)]
pub enum MachineRegistryError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] MachineDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] MachineRepositoryError),
}

/// Result type for machine registry operations.
pub type MachineRegistryResult<T> = Result<T, MachineRegistryError>;

/// Machine registry orchestration service.
#[derive(Clone)]
pub struct MachineRegistryService<R, C>
where
    R: MachineRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    observers: Vec<Arc<dyn MachineStateObserver>>,
}

impl<R, C> MachineRegistryService<R, C>
where
    R: MachineRepository,
    C: Clock + Send + Sync,
{
    /// Creates a registry service with no observers.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self {
            repository,
            clock,
            observers: Vec::new(),
        }
    }

    /// Registers a hook invoked after every committed state change.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn MachineStateObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Returns the underlying repository.
    #[must_use]
    pub const fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Registers a new machine.
    ///
    /// A machine registered directly in a trigger state is announced to the
    /// observers as a change from no previous state.
    ///
    /// # Errors
    ///
    /// Returns [`MachineRegistryError`] when validation fails or the code is
    /// already taken.
    #[instrument(skip(self, request), fields(code = %request.code))]
    pub async fn register(&self, request: RegisterMachineRequest) -> MachineRegistryResult<Machine> {
        let RegisterMachineRequest {
            code,
            name,
            description,
            state,
            responsible,
            machine_type,
        } = request;

        let code = MachineCode::new(code)?;
        let details = build_details(&name, description, responsible, machine_type)?;
        let machine = Machine::new(code, details, state, &*self.clock);
        self.repository.store(&machine).await?;
        info!(machine_id = %machine.id(), state = %machine.state(), "machine registered");

        self.notify(&machine, &machine.initial_state_change()).await;
        Ok(machine)
    }

    /// Moves a machine to a new operational state and notifies observers.
    ///
    /// Setting the current state again is a no-op that notifies nobody. The
    /// write only lands if the stored state is still the one read; when a
    /// concurrent change won, the machine is re-read and the change retried,
    /// so the reported previous state is always the one replaced.
    ///
    /// # Errors
    ///
    /// Returns [`MachineRegistryError::Repository`] when the machine does not
    /// exist or the write fails. Observer failures are logged, not returned.
    #[instrument(skip(self), fields(machine_id = %id))]
    pub async fn change_state(
        &self,
        id: MachineId,
        state: MachineState,
    ) -> MachineRegistryResult<Machine> {
        loop {
            let mut machine = self.find_or_error(id).await?;
            let expected = machine.state();
            let Some(change) = machine.change_state(state, &*self.clock) else {
                debug!(%state, "machine already in requested state");
                return Ok(machine);
            };
            if !self.repository.update_state(&machine, expected).await? {
                debug!(%expected, "machine state changed concurrently, retrying");
                continue;
            }
            info!(
                previous = ?change.previous(),
                current = %change.current(),
                "machine state changed"
            );

            self.notify(&machine, &change).await;
            return Ok(machine);
        }
    }

    /// Replaces a machine's descriptive fields. The operational state is
    /// left as stored.
    ///
    /// # Errors
    ///
    /// Returns [`MachineRegistryError`] when validation fails or the machine
    /// does not exist.
    pub async fn update_details(
        &self,
        id: MachineId,
        request: UpdateMachineRequest,
    ) -> MachineRegistryResult<Machine> {
        let details = request.into_details()?;
        let mut machine = self.find_or_error(id).await?;
        machine.update_details(details, &*self.clock);
        self.repository.update(&machine).await?;
        self.find_or_error(id).await
    }

    /// Activates or deactivates a machine.
    ///
    /// # Errors
    ///
    /// Returns [`MachineRegistryError::Repository`] when the machine does not
    /// exist or the write fails.
    pub async fn set_active(&self, id: MachineId, active: bool) -> MachineRegistryResult<Machine> {
        let mut machine = self.find_or_error(id).await?;
        machine.set_active(active, &*self.clock);
        self.repository.update(&machine).await?;
        self.find_or_error(id).await
    }

    /// Finds a machine by identifier.
    ///
    /// # Errors
    ///
    /// Returns [`MachineRegistryError::Repository`] when the lookup fails.
    pub async fn find_by_id(&self, id: MachineId) -> MachineRegistryResult<Option<Machine>> {
        Ok(self.repository.find_by_id(id).await?)
    }

    /// Finds a machine by code.
    ///
    /// # Errors
    ///
    /// Returns [`MachineRegistryError`] when the code is invalid or the
    /// lookup fails.
    pub async fn find_by_code(&self, code: &str) -> MachineRegistryResult<Option<Machine>> {
        let code = MachineCode::new(code)?;
        Ok(self.repository.find_by_code(&code).await?)
    }

    /// Lists machines matching the filter.
    ///
    /// # Errors
    ///
    /// Returns [`MachineRegistryError::Repository`] when the query fails.
    pub async fn list(&self, filter: &MachineFilter) -> MachineRegistryResult<Vec<Machine>> {
        Ok(self.repository.list(filter).await?)
    }

    async fn find_or_error(&self, id: MachineId) -> MachineRegistryResult<Machine> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| MachineRepositoryError::NotFound(id).into())
    }

    async fn notify(&self, machine: &Machine, change: &MachineStateChange) {
        for observer in &self.observers {
            if let Err(err) = observer.on_state_changed(machine, change).await {
                error!(
                    machine_id = %machine.id(),
                    observer = err.observer(),
                    error = %err,
                    "machine state observer failed; machine update kept"
                );
            }
        }
    }
}
