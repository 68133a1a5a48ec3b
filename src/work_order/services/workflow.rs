//! Service layer for the work-order lifecycle.
//!
//! Every operation takes the acting [`Actor`] explicitly. Checks run in a
//! fixed order: capability, then eligibility of the stored order, then
//! identity. Eligibility is checked once more by the repository inside the
//! write, so a caller that loses a race gets
//! [`TransitionOutcome::NotEligible`] instead of overwriting the winner.

use super::numbering::{DEFAULT_NUMBERING_RETRIES, insert_with_retry};
use crate::access::{
    domain::{Actor, Capability, UserId},
    ports::CapabilityProvider,
};
use crate::machinery::{
    domain::{MachineId, MachineState, MachineTypeId},
    ports::MachineRepository,
    services::{MachineRegistryError, MachineRegistryService},
};
use crate::work_order::{
    domain::{
        ExecutionDetailUpdate, Party, PendingWorkOrder, PersonnelHours, Priority, Requirement,
        SparePartUsage, TransitionGuard, WorkOrder, WorkOrderDetails, WorkOrderDomainError,
        WorkOrderId, WorkOrderStatus, WorkOrderTransition, WorkType,
    },
    ports::{WorkOrderRepository, WorkOrderRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

const DRAFT: &[WorkOrderStatus] = &[WorkOrderStatus::Draft];
const IN_EXECUTION: &[WorkOrderStatus] = &[WorkOrderStatus::InExecution];
const EDITABLE: &[WorkOrderStatus] = &[
    WorkOrderStatus::Draft,
    WorkOrderStatus::Request,
    WorkOrderStatus::Assigned,
    WorkOrderStatus::InExecution,
    WorkOrderStatus::InReview,
    WorkOrderStatus::Approved,
];

/// Request payload for creating a work order by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWorkOrderRequest {
    machine: MachineId,
    title: String,
    description: String,
    priority: Priority,
    work_type: WorkType,
    scheduled_at: Option<DateTime<Utc>>,
    machine_type: Option<MachineTypeId>,
}

impl CreateWorkOrderRequest {
    /// Creates a request with default priority and work type.
    #[must_use]
    pub fn new(
        machine: MachineId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            machine,
            title: title.into(),
            description: description.into(),
            priority: Priority::default(),
            work_type: WorkType::default(),
            scheduled_at: None,
            machine_type: None,
        }
    }

    /// Sets the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the work type.
    #[must_use]
    pub const fn with_work_type(mut self, work_type: WorkType) -> Self {
        self.work_type = work_type;
        self
    }

    /// Sets the scheduled start.
    #[must_use]
    pub const fn with_scheduled_at(mut self, scheduled_at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(scheduled_at);
        self
    }

    /// Sets the machine type. Defaults to the machine's own type.
    #[must_use]
    pub const fn with_machine_type(mut self, machine_type: MachineTypeId) -> Self {
        self.machine_type = Some(machine_type);
        self
    }
}

/// Result of a lifecycle operation that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The operation was applied and persisted.
    Applied(Box<WorkOrder>),
    /// The order was not in a state allowing the operation. Nothing changed.
    NotEligible {
        /// Work order that was addressed.
        id: WorkOrderId,
        /// Operation that was attempted.
        operation: &'static str,
        /// Status observed when the operation was refused.
        status: WorkOrderStatus,
    },
}

impl TransitionOutcome {
    /// Returns `true` when the operation was applied.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// Returns the updated order when the operation was applied.
    #[must_use]
    pub fn applied(self) -> Option<WorkOrder> {
        match self {
            Self::Applied(order) => Some(*order),
            Self::NotEligible { .. } => None,
        }
    }
}

/// Service-level errors for work-order lifecycle operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The actor lacks the capability or identity the operation requires.
    #[error("{actor} may not {operation}: requires {requirement}")]
    Unauthorized {
        /// Refused actor.
        actor: UserId,
        /// Operation that was attempted.
        operation: &'static str,
        /// What the operation requires.
        requirement: Requirement,
    },

    /// The work order does not exist.
    #[error("work order not found: {0}")]
    NotFound(WorkOrderId),

    /// The machine the order would belong to does not exist.
    #[error("machine not found: {0}")]
    MachineNotFound(MachineId),

    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] WorkOrderDomainError),

    /// Work-order repository operation failed.
    #[error(transparent)]
    Repository(#[from] WorkOrderRepositoryError),

    /// Machine registry operation failed.
    #[error(transparent)]
    Machine(#[from] MachineRegistryError),
}

/// Result type for work-order lifecycle operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Work-order lifecycle orchestration service.
pub struct WorkOrderWorkflowService<W, M, C>
where
    W: WorkOrderRepository,
    M: MachineRepository,
    C: Clock + Send + Sync,
{
    work_orders: Arc<W>,
    machines: Arc<MachineRegistryService<M, C>>,
    capabilities: Arc<dyn CapabilityProvider>,
    clock: Arc<C>,
    numbering_retries: u32,
}

impl<W, M, C> WorkOrderWorkflowService<W, M, C>
where
    W: WorkOrderRepository,
    M: MachineRepository,
    C: Clock + Send + Sync,
{
    /// Creates a workflow service.
    #[must_use]
    pub fn new(
        work_orders: Arc<W>,
        machines: Arc<MachineRegistryService<M, C>>,
        capabilities: Arc<dyn CapabilityProvider>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            work_orders,
            machines,
            capabilities,
            clock,
            numbering_retries: DEFAULT_NUMBERING_RETRIES,
        }
    }

    /// Sets how often creation retries after a numbering collision.
    #[must_use]
    pub const fn with_numbering_retries(mut self, retries: u32) -> Self {
        self.numbering_retries = retries;
        self
    }

    /// Creates a numbered draft against an existing machine.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Unauthorized`] without `create_odt`,
    /// [`WorkflowError::MachineNotFound`] for an unknown machine and
    /// [`WorkflowError::Repository`] when numbering keeps colliding.
    #[instrument(skip(self, actor, request), fields(actor = %actor.id(), machine_id = %request.machine))]
    pub async fn create(
        &self,
        actor: &Actor,
        request: CreateWorkOrderRequest,
    ) -> WorkflowResult<WorkOrder> {
        self.require_capability(actor, "create", Capability::CreateOdt)?;
        let CreateWorkOrderRequest {
            machine,
            title,
            description,
            priority,
            work_type,
            scheduled_at,
            machine_type,
        } = request;

        let machine_record = self
            .machines
            .find_by_id(machine)
            .await?
            .ok_or(WorkflowError::MachineNotFound(machine))?;

        let mut details = WorkOrderDetails::new(title, description)?
            .with_priority(priority)
            .with_work_type(work_type);
        if let Some(scheduled) = scheduled_at {
            details = details.with_scheduled_at(scheduled);
        }
        if let Some(type_id) = machine_type.or_else(|| machine_record.details().machine_type()) {
            details = details.with_machine_type(type_id);
        }

        let pending = PendingWorkOrder::new(machine, details, Some(actor.id()), &*self.clock);
        let order = insert_with_retry(&*self.work_orders, pending, self.numbering_retries).await?;
        info!(
            work_order_id = %order.id(),
            correlative = %order.numbers().correlative(),
            odt_number = %order.numbers().odt_number(),
            "work order created"
        );
        Ok(order)
    }

    /// Submits a draft for authorization.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the actor is not allowed or the
    /// order cannot be loaded or written.
    pub async fn submit_request(
        &self,
        actor: &Actor,
        id: WorkOrderId,
    ) -> WorkflowResult<TransitionOutcome> {
        self.transition(actor, id, WorkOrderTransition::SubmitRequest)
            .await
    }

    /// Assigns the execution responsible; the actor becomes the authorizer.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the actor is not allowed or the
    /// order cannot be loaded or written.
    pub async fn assign_responsible(
        &self,
        actor: &Actor,
        id: WorkOrderId,
        responsible: UserId,
    ) -> WorkflowResult<TransitionOutcome> {
        self.transition(
            actor,
            id,
            WorkOrderTransition::AssignResponsible { responsible },
        )
        .await
    }

    /// Starts execution.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the actor is not allowed or the
    /// order cannot be loaded or written.
    pub async fn start_execution(
        &self,
        actor: &Actor,
        id: WorkOrderId,
    ) -> WorkflowResult<TransitionOutcome> {
        self.transition(actor, id, WorkOrderTransition::StartExecution)
            .await
    }

    /// Hands the work in for review and signs the execution detail.
    ///
    /// Not eligible until an execution detail has been recorded.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the actor is not allowed or the
    /// order cannot be loaded or written.
    pub async fn submit_for_review(
        &self,
        actor: &Actor,
        id: WorkOrderId,
    ) -> WorkflowResult<TransitionOutcome> {
        self.transition(actor, id, WorkOrderTransition::SubmitForReview)
            .await
    }

    /// Signs the review off. The order stays in review awaiting final
    /// approval.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the actor is not allowed or the
    /// order cannot be loaded or written.
    pub async fn review_approve(
        &self,
        actor: &Actor,
        id: WorkOrderId,
    ) -> WorkflowResult<TransitionOutcome> {
        self.transition(actor, id, WorkOrderTransition::ReviewApprove)
            .await
    }

    /// Rejects the work at review.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the actor is not allowed or the
    /// order cannot be loaded or written.
    pub async fn review_reject(
        &self,
        actor: &Actor,
        id: WorkOrderId,
    ) -> WorkflowResult<TransitionOutcome> {
        self.transition(actor, id, WorkOrderTransition::ReviewReject)
            .await
    }

    /// Approves reviewed work and puts the machine into maintenance.
    ///
    /// The machine is only touched after the order write succeeded, so a
    /// repeated call is not eligible and leaves the machine alone.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the actor is not allowed, the order
    /// cannot be loaded or written, or the machine update fails.
    pub async fn approve_final(
        &self,
        actor: &Actor,
        id: WorkOrderId,
    ) -> WorkflowResult<TransitionOutcome> {
        let outcome = self
            .transition(actor, id, WorkOrderTransition::ApproveFinal)
            .await?;
        if let TransitionOutcome::Applied(order) = &outcome {
            self.machines
                .change_state(order.machine(), MachineState::InMaintenance)
                .await?;
        }
        Ok(outcome)
    }

    /// Rejects reviewed work at final approval.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the actor is not allowed or the
    /// order cannot be loaded or written.
    pub async fn reject_approval(
        &self,
        actor: &Actor,
        id: WorkOrderId,
    ) -> WorkflowResult<TransitionOutcome> {
        self.transition(actor, id, WorkOrderTransition::RejectApproval)
            .await
    }

    /// Closes an approved order.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the actor is not allowed or the
    /// order cannot be loaded or written.
    pub async fn close(&self, actor: &Actor, id: WorkOrderId) -> WorkflowResult<TransitionOutcome> {
        self.transition(actor, id, WorkOrderTransition::Close).await
    }

    /// Returns a rejected order to draft, clearing all sign-offs.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the actor is not allowed or the
    /// order cannot be loaded or written.
    pub async fn reopen(&self, actor: &Actor, id: WorkOrderId) -> WorkflowResult<TransitionOutcome> {
        self.transition(actor, id, WorkOrderTransition::Reopen).await
    }

    /// Creates the execution detail if needed and applies `update` to it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the actor is not the execution
    /// responsible or the order cannot be loaded or written.
    #[instrument(skip(self, actor, update), fields(actor = %actor.id(), work_order_id = %id))]
    pub async fn record_execution_detail(
        &self,
        actor: &Actor,
        id: WorkOrderId,
        update: ExecutionDetailUpdate,
    ) -> WorkflowResult<TransitionOutcome> {
        const OPERATION: &str = "record_execution_detail";
        let requirement =
            Requirement::capability(Capability::ExecuteOdt).and_party(Party::ExecutionResponsible);
        self.require(actor, OPERATION, requirement, None)?;
        let mut order = self.load(id).await?;
        let guard = TransitionGuard::for_statuses(IN_EXECUTION);
        if !guard.admits(&order) {
            return Ok(not_eligible(&order, OPERATION));
        }
        self.require(actor, OPERATION, requirement, Some(&order))?;

        order.record_execution(update, &*self.clock);
        self.write_guarded(order, &guard, OPERATION).await
    }

    /// Appends a spare part line.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the actor may not edit the order or
    /// the order cannot be loaded or written.
    pub async fn add_spare_part(
        &self,
        actor: &Actor,
        id: WorkOrderId,
        part: SparePartUsage,
    ) -> WorkflowResult<TransitionOutcome> {
        self.edit_line_items(actor, id, "add_spare_part", |order, clock| {
            order.add_spare_part(part, clock);
        })
        .await
    }

    /// Appends a personnel-hours line.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the actor may not edit the order or
    /// the order cannot be loaded or written.
    pub async fn add_personnel_hours(
        &self,
        actor: &Actor,
        id: WorkOrderId,
        entry: PersonnelHours,
    ) -> WorkflowResult<TransitionOutcome> {
        self.edit_line_items(actor, id, "add_personnel_hours", |order, clock| {
            order.add_personnel_hours(entry, clock);
        })
        .await
    }

    /// Replaces the descriptive fields.
    ///
    /// The creator may edit a draft; holders of `edit_full_odt` may edit
    /// any order that is not terminal.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError`] when the actor may not edit the order or
    /// the order cannot be loaded or written.
    #[instrument(skip(self, actor, details), fields(actor = %actor.id(), work_order_id = %id))]
    pub async fn update_details(
        &self,
        actor: &Actor,
        id: WorkOrderId,
        details: WorkOrderDetails,
    ) -> WorkflowResult<TransitionOutcome> {
        const OPERATION: &str = "update_details";
        let full_edit = self.has(actor, Capability::EditFullOdt);
        let mut order = self.load(id).await?;
        let guard = TransitionGuard::for_statuses(if full_edit { EDITABLE } else { DRAFT });
        if !guard.admits(&order) {
            return Ok(not_eligible(&order, OPERATION));
        }
        let requirement = Requirement::party(Party::Creator).or_capability(Capability::EditFullOdt);
        self.require(actor, OPERATION, requirement, Some(&order))?;

        order.update_details(details, &*self.clock);
        self.write_guarded(order, &guard, OPERATION).await
    }

    /// Returns the order if the actor may see it.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowError::Unauthorized`] when the actor lacks
    /// `view_detail` and is neither creator nor execution responsible.
    pub async fn find(&self, actor: &Actor, id: WorkOrderId) -> WorkflowResult<Option<WorkOrder>> {
        let Some(order) = self.work_orders.find_by_id(id).await? else {
            return Ok(None);
        };
        let visible = self.has(actor, Capability::ViewDetail)
            || order.is_created_by(actor)
            || order.is_assigned_to(actor);
        if !visible {
            return Err(deny(
                actor,
                "find",
                Requirement::capability(Capability::ViewDetail),
            ));
        }
        Ok(Some(order))
    }

    #[instrument(
        skip(self, actor, transition),
        fields(actor = %actor.id(), work_order_id = %id, transition = transition.name())
    )]
    async fn transition(
        &self,
        actor: &Actor,
        id: WorkOrderId,
        transition: WorkOrderTransition,
    ) -> WorkflowResult<TransitionOutcome> {
        let operation = transition.name();
        let requirement = transition.requirement();
        self.require(actor, operation, requirement, None)?;

        let mut order = self.load(id).await?;
        let guard = transition.guard();
        if !guard.admits(&order) {
            return Ok(not_eligible(&order, operation));
        }
        self.require(actor, operation, requirement, Some(&order))?;

        order.apply(&transition, actor, &*self.clock)?;
        self.write_guarded(order, &guard, operation).await
    }

    async fn edit_line_items<F>(
        &self,
        actor: &Actor,
        id: WorkOrderId,
        operation: &'static str,
        edit: F,
    ) -> WorkflowResult<TransitionOutcome>
    where
        F: FnOnce(&mut WorkOrder, &C) + Send,
    {
        let full_edit = self.has(actor, Capability::EditFullOdt);
        let mut order = self.load(id).await?;
        let guard = TransitionGuard::for_statuses(if full_edit { EDITABLE } else { IN_EXECUTION });
        if !guard.admits(&order) {
            return Ok(not_eligible(&order, operation));
        }
        let requirement = Requirement::party(Party::ExecutionResponsible)
            .or_capability(Capability::EditFullOdt);
        self.require(actor, operation, requirement, Some(&order))?;

        edit(&mut order, &*self.clock);
        self.write_guarded(order, &guard, operation).await
    }

    async fn write_guarded(
        &self,
        order: WorkOrder,
        guard: &TransitionGuard,
        operation: &'static str,
    ) -> WorkflowResult<TransitionOutcome> {
        if !self.work_orders.update_guarded(&order, guard).await? {
            let current = self.load(order.id()).await?;
            return Ok(not_eligible(&current, operation));
        }
        info!(
            work_order_id = %order.id(),
            operation,
            status = %order.status(),
            "work order updated"
        );
        Ok(TransitionOutcome::Applied(Box::new(order)))
    }

    async fn load(&self, id: WorkOrderId) -> WorkflowResult<WorkOrder> {
        self.work_orders
            .find_by_id(id)
            .await?
            .ok_or(WorkflowError::NotFound(id))
    }

    fn has(&self, actor: &Actor, capability: Capability) -> bool {
        self.capabilities.actor_has_capability(actor, capability)
    }

    /// Checks the capability part of `requirement`, and the party part too
    /// once the order is known.
    fn require(
        &self,
        actor: &Actor,
        operation: &'static str,
        requirement: Requirement,
        order: Option<&WorkOrder>,
    ) -> WorkflowResult<()> {
        if requirement
            .required_capability()
            .is_some_and(|capability| !self.has(actor, capability))
        {
            return Err(deny(actor, operation, requirement));
        }
        let (Some(order), Some(party)) = (order, requirement.required_party()) else {
            return Ok(());
        };
        let waived = requirement
            .party_override()
            .is_some_and(|capability| self.has(actor, capability));
        if waived || party.matches(order, actor) {
            return Ok(());
        }
        Err(deny(actor, operation, requirement))
    }

    fn require_capability(
        &self,
        actor: &Actor,
        operation: &'static str,
        capability: Capability,
    ) -> WorkflowResult<()> {
        self.require(actor, operation, Requirement::capability(capability), None)
    }
}

fn deny(actor: &Actor, operation: &'static str, requirement: Requirement) -> WorkflowError {
    warn!(actor = %actor.id(), operation, %requirement, "operation denied");
    WorkflowError::Unauthorized {
        actor: actor.id(),
        operation,
        requirement,
    }
}

fn not_eligible(order: &WorkOrder, operation: &'static str) -> TransitionOutcome {
    warn!(
        work_order_id = %order.id(),
        operation,
        status = %order.status(),
        "work order not eligible"
    );
    TransitionOutcome::NotEligible {
        id: order.id(),
        operation,
        status: order.status(),
    }
}
