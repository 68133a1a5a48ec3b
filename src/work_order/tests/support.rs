//! Shared builders for work-order tests.

use std::sync::Arc;

use crate::access::{
    adapters::memory::RoleDirectory,
    domain::{Actor, Capability, RoleName, UserId},
};
use crate::machinery::{
    adapters::memory::InMemoryMachineRepository,
    domain::{Machine, MachineId},
    services::{MachineRegistryService, RegisterMachineRequest},
};
use crate::work_order::{
    adapters::memory::InMemoryWorkOrderRepository,
    domain::{PendingWorkOrder, WorkOrder, WorkOrderDetails, WorkOrderNumbers},
    services::WorkOrderWorkflowService,
};
use mockable::DefaultClock;

pub(super) type Registry = MachineRegistryService<InMemoryMachineRepository, DefaultClock>;
pub(super) type Workflow =
    WorkOrderWorkflowService<InMemoryWorkOrderRepository, InMemoryMachineRepository, DefaultClock>;

/// A draft numbered 1/1 for a fresh machine.
pub(super) fn draft(creator: Option<UserId>) -> WorkOrder {
    let details = WorkOrderDetails::new("Replace hydraulic hose", "Leak at boom cylinder")
        .expect("valid details");
    PendingWorkOrder::new(MachineId::new(), details, creator, &DefaultClock)
        .into_numbered(WorkOrderNumbers::first())
}

pub(super) fn actor(name: &str) -> Actor {
    Actor::new(UserId::new(), name)
}

/// Cast of users holding the default roles.
pub(super) struct Staff {
    pub operator: Actor,
    pub technician: Actor,
    pub supervisor: Actor,
    pub manager: Actor,
    pub outsider: Actor,
}

impl Staff {
    pub(super) fn enrol(directory: &RoleDirectory) -> Self {
        let staff = Self {
            operator: actor("Operator"),
            technician: actor("Technician"),
            supervisor: actor("Supervisor"),
            manager: actor("Area manager"),
            outsider: actor("Visitor"),
        };
        for (member, role) in [
            (&staff.operator, RoleName::operator()),
            (&staff.technician, RoleName::operator()),
            (&staff.supervisor, RoleName::supervisor()),
            (&staff.manager, RoleName::area_manager()),
        ] {
            directory
                .assign_role(member.id(), role)
                .expect("role assignment succeeds");
        }
        directory
            .grant(staff.outsider.id(), Capability::ViewDetail)
            .expect("grant succeeds");
        staff
    }
}

/// In-memory wiring of the workflow service.
pub(super) struct Harness {
    pub work_orders: Arc<InMemoryWorkOrderRepository>,
    pub registry: Arc<Registry>,
    pub directory: Arc<RoleDirectory>,
    pub workflow: Workflow,
    pub staff: Staff,
}

impl Harness {
    pub(super) fn new() -> Self {
        let work_orders = Arc::new(InMemoryWorkOrderRepository::new());
        let registry = Arc::new(MachineRegistryService::new(
            Arc::new(InMemoryMachineRepository::new()),
            Arc::new(DefaultClock),
        ));
        let directory = Arc::new(RoleDirectory::with_default_roles());
        let staff = Staff::enrol(&directory);
        let workflow = WorkOrderWorkflowService::new(
            Arc::clone(&work_orders),
            Arc::clone(&registry),
            directory.clone(),
            Arc::new(DefaultClock),
        );
        Self {
            work_orders,
            registry,
            directory,
            workflow,
            staff,
        }
    }

    pub(super) async fn machine(&self, code: &str) -> Machine {
        self.registry
            .register(RegisterMachineRequest::new(code, format!("Machine {code}")))
            .await
            .expect("machine registration succeeds")
    }
}
