//! Shared wiring for in-memory integration tests.

use std::sync::Arc;

use odt_control::{
    access::{
        adapters::memory::RoleDirectory,
        domain::{Actor, RoleName, UserId},
    },
    machinery::{
        adapters::memory::InMemoryMachineRepository,
        domain::Machine,
        services::{MachineRegistryService, RegisterMachineRequest},
    },
    work_order::{
        adapters::memory::InMemoryWorkOrderRepository,
        domain::{ExecutionDetailUpdate, WorkOrder, WorkOrderId},
        ports::{WorkOrderFilter, WorkOrderRepository},
        services::{
            MachineStateTracker, TransitionOutcome, WorkOrderQueryService,
            WorkOrderWorkflowService,
        },
    },
};
use mockable::DefaultClock;
use rstest::fixture;

/// Machine registry wired with the automatic-draft tracker.
pub type Registry = MachineRegistryService<InMemoryMachineRepository, DefaultClock>;

/// Workflow service over in-memory adapters.
pub type Workflow =
    WorkOrderWorkflowService<InMemoryWorkOrderRepository, InMemoryMachineRepository, DefaultClock>;

/// Users holding each of the default roles.
pub struct Staff {
    pub operator: Actor,
    pub technician: Actor,
    pub supervisor: Actor,
    pub manager: Actor,
}

/// Every service of the crate wired over shared in-memory adapters.
pub struct Plant {
    pub work_orders: Arc<InMemoryWorkOrderRepository>,
    pub registry: Arc<Registry>,
    pub workflow: Arc<Workflow>,
    pub queries: WorkOrderQueryService<InMemoryWorkOrderRepository>,
    pub directory: Arc<RoleDirectory>,
    pub staff: Staff,
}

impl Plant {
    /// Builds a plant with the default roles and automatic drafting.
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
        let staff = Staff {
            operator: enrol(&directory, "Operator", RoleName::operator()),
            technician: enrol(&directory, "Technician", RoleName::operator()),
            supervisor: enrol(&directory, "Supervisor", RoleName::supervisor()),
            manager: enrol(&directory, "Area manager", RoleName::area_manager()),
        };
        let workflow = Arc::new(WorkOrderWorkflowService::new(
            Arc::clone(&work_orders),
            Arc::clone(&registry),
            directory.clone(),
            clock,
        ));
        let queries = WorkOrderQueryService::new(Arc::clone(&work_orders), directory.clone());
        Self {
            work_orders,
            registry,
            workflow,
            queries,
            directory,
            staff,
        }
    }

    /// Registers an operative machine the operator is responsible for.
    ///
    /// # Errors
    ///
    /// Returns an error when registration fails.
    pub async fn machine(&self, code: &str) -> Result<Machine, eyre::Report> {
        Ok(self
            .registry
            .register(
                RegisterMachineRequest::new(code, format!("Machine {code}"))
                    .with_responsible(self.staff.operator.id()),
            )
            .await?)
    }

    /// Lists every work order raised against `machine`.
    ///
    /// # Errors
    ///
    /// Returns an error when the listing fails.
    pub async fn orders_for(&self, machine: &Machine) -> Result<Vec<WorkOrder>, eyre::Report> {
        Ok(self
            .work_orders
            .list(&WorkOrderFilter {
                machine: Some(machine.id()),
                ..WorkOrderFilter::default()
            })
            .await?)
    }

    /// Takes a draft through request, assignment and execution into review.
    ///
    /// # Errors
    ///
    /// Returns an error when any step fails or is not eligible.
    pub async fn into_review(&self, id: WorkOrderId) -> Result<WorkOrder, eyre::Report> {
        let staff = &self.staff;
        applied(self.workflow.submit_request(&staff.operator, id).await?)?;
        applied(
            self.workflow
                .assign_responsible(&staff.supervisor, id, staff.technician.id())
                .await?,
        )?;
        applied(self.workflow.start_execution(&staff.technician, id).await?)?;
        applied(
            self.workflow
                .record_execution_detail(
                    &staff.technician,
                    id,
                    ExecutionDetailUpdate {
                        tasks_performed: Some("Replaced hydraulic hose".to_owned()),
                        ..ExecutionDetailUpdate::default()
                    },
                )
                .await?,
        )?;
        applied(self.workflow.submit_for_review(&staff.technician, id).await?)
    }
}

impl Default for Plant {
    fn default() -> Self {
        Self::new()
    }
}

fn enrol(directory: &RoleDirectory, name: &str, role: RoleName) -> Actor {
    let actor = Actor::new(UserId::new(), name);
    directory
        .assign_role(actor.id(), role)
        .expect("role assignment succeeds");
    actor
}

/// Unwraps an applied outcome.
///
/// # Errors
///
/// Returns an error when the operation was not eligible.
pub fn applied(outcome: TransitionOutcome) -> Result<WorkOrder, eyre::Report> {
    match outcome {
        TransitionOutcome::Applied(order) => Ok(*order),
        TransitionOutcome::NotEligible {
            operation, status, ..
        } => Err(eyre::eyre!("{operation} not eligible in {status}")),
    }
}

/// Provides a freshly wired plant for each test.
#[fixture]
pub fn plant() -> Plant {
    Plant::new()
}
