//! Shared world state for work-order lifecycle BDD scenarios.

use std::collections::HashMap;
use std::sync::Arc;

use odt_control::{
    access::{
        adapters::memory::RoleDirectory,
        domain::{Actor, RoleName, UserId},
    },
    machinery::{
        adapters::memory::InMemoryMachineRepository,
        domain::{Machine, MachineState},
        services::MachineRegistryService,
    },
    work_order::{
        adapters::memory::InMemoryWorkOrderRepository,
        domain::{WorkOrder, WorkOrderId},
        ports::{WorkOrderFilter, WorkOrderRepository},
        services::{
            MachineStateTracker, TransitionOutcome, WorkOrderWorkflowService, WorkflowError,
        },
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// Registry type used by the BDD world.
pub type TestRegistry = MachineRegistryService<InMemoryMachineRepository, DefaultClock>;

/// Workflow type used by the BDD world.
pub type TestWorkflow =
    WorkOrderWorkflowService<InMemoryWorkOrderRepository, InMemoryMachineRepository, DefaultClock>;

/// Scenario world for work-order lifecycle behaviour tests.
pub struct OdtWorld {
    pub work_orders: Arc<InMemoryWorkOrderRepository>,
    pub registry: Arc<TestRegistry>,
    pub workflow: TestWorkflow,
    pub actors: HashMap<&'static str, Actor>,
    pub machine: Option<Machine>,
    pub last_result: Option<Result<TransitionOutcome, WorkflowError>>,
}

impl OdtWorld {
    /// Creates a world with one actor per default role.
    #[must_use]
    pub fn new() -> Self {
        let clock = Arc::new(DefaultClock);
        let work_orders = Arc::new(InMemoryWorkOrderRepository::new());
        let tracker = MachineStateTracker::new(Arc::clone(&work_orders), Arc::clone(&clock));
        let registry = Arc::new(
            MachineRegistryService::new(Arc::new(InMemoryMachineRepository::new()), Arc::clone(&clock))
                .with_observer(Arc::new(tracker)),
        );
        let directory = Arc::new(RoleDirectory::with_default_roles());
        let mut actors = HashMap::new();
        for (name, role) in [
            ("operator", RoleName::operator()),
            ("technician", RoleName::operator()),
            ("supervisor", RoleName::supervisor()),
            ("area manager", RoleName::area_manager()),
        ] {
            let actor = Actor::new(UserId::new(), name);
            directory
                .assign_role(actor.id(), role)
                .expect("role assignment succeeds");
            actors.insert(name, actor);
        }
        let workflow = WorkOrderWorkflowService::new(
            Arc::clone(&work_orders),
            Arc::clone(&registry),
            directory,
            clock,
        );

        Self {
            work_orders,
            registry,
            workflow,
            actors,
            machine: None,
            last_result: None,
        }
    }

    /// Returns the scenario actor playing `name`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown name.
    pub fn actor(&self, name: &str) -> Result<Actor, eyre::Report> {
        self.actors
            .get(name)
            .cloned()
            .ok_or_else(|| eyre::eyre!("no scenario actor named {name}"))
    }

    /// Returns the machine under test.
    ///
    /// # Errors
    ///
    /// Returns an error before a machine has been registered.
    pub fn machine(&self) -> Result<&Machine, eyre::Report> {
        self.machine
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing machine in scenario world"))
    }

    /// Returns the newest work order raised against the machine.
    ///
    /// # Errors
    ///
    /// Returns an error when the machine has no work order.
    pub fn work_order(&self) -> Result<WorkOrder, eyre::Report> {
        let machine = self.machine()?.id();
        let orders = run_async(self.work_orders.list(&WorkOrderFilter {
            machine: Some(machine),
            ..WorkOrderFilter::default()
        }))?;
        orders
            .into_iter()
            .next()
            .ok_or_else(|| eyre::eyre!("machine has no work order"))
    }

    /// Moves the machine under test to the state named by its storage code.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown state or a failed update.
    pub fn change_machine_state(&mut self, state: &str) -> Result<(), eyre::Report> {
        let target = MachineState::try_from(state)
            .map_err(|err| eyre::eyre!("invalid machine state in scenario: {err}"))?;
        let id = self.machine()?.id();
        let updated = run_async(self.registry.change_state(id, target))?;
        self.machine = Some(updated);
        Ok(())
    }

    /// Returns the identifier of the newest work order.
    ///
    /// # Errors
    ///
    /// Returns an error when the machine has no work order.
    pub fn work_order_id(&self) -> Result<WorkOrderId, eyre::Report> {
        Ok(self.work_order()?.id())
    }
}

impl Default for OdtWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> OdtWorld {
    OdtWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
