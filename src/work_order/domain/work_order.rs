//! Work-order aggregate root.

use super::{
    ExecutionDetail, ExecutionDetailUpdate, PersonnelHours, Priority, SparePartUsage,
    WorkOrderDomainError, WorkOrderId, WorkOrderNumbers, WorkOrderStatus, WorkOrderTransition,
    WorkType,
};
use crate::access::domain::{Actor, UserId};
use crate::machinery::domain::{MachineId, MachineTypeId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to an uploaded report document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReportFile(String);

impl ReportFile {
    /// Wraps a stored file path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Returns the stored path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReportFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Editable descriptive fields of a work order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrderDetails {
    title: String,
    description: String,
    priority: Priority,
    work_type: WorkType,
    scheduled_at: Option<DateTime<Utc>>,
    machine_type: Option<MachineTypeId>,
    report_file: Option<ReportFile>,
}

impl WorkOrderDetails {
    /// Creates details with default priority and work type.
    ///
    /// # Errors
    ///
    /// Returns [`WorkOrderDomainError::EmptyTitle`] when the title is blank.
    pub fn new(
        title: impl AsRef<str>,
        description: impl AsRef<str>,
    ) -> Result<Self, WorkOrderDomainError> {
        let trimmed = title.as_ref().trim();
        if trimmed.is_empty() {
            return Err(WorkOrderDomainError::EmptyTitle);
        }
        Ok(Self {
            title: trimmed.to_owned(),
            description: description.as_ref().trim().to_owned(),
            priority: Priority::default(),
            work_type: WorkType::default(),
            scheduled_at: None,
            machine_type: None,
            report_file: None,
        })
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

    /// Sets the machine type.
    #[must_use]
    pub const fn with_machine_type(mut self, machine_type: MachineTypeId) -> Self {
        self.machine_type = Some(machine_type);
        self
    }

    /// Attaches a report file.
    #[must_use]
    pub fn with_report_file(mut self, report_file: ReportFile) -> Self {
        self.report_file = Some(report_file);
        self
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the work description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the work type.
    #[must_use]
    pub const fn work_type(&self) -> WorkType {
        self.work_type
    }

    /// Returns the scheduled start, if any.
    #[must_use]
    pub const fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        self.scheduled_at
    }

    /// Returns the machine type, if any.
    #[must_use]
    pub const fn machine_type(&self) -> Option<MachineTypeId> {
        self.machine_type
    }

    /// Returns the attached report, if any.
    #[must_use]
    pub const fn report_file(&self) -> Option<&ReportFile> {
        self.report_file.as_ref()
    }
}

/// A draft work order that has not been numbered yet.
///
/// Only the repository turns it into a [`WorkOrder`], assigning both
/// sequential numbers in the same write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWorkOrder {
    id: WorkOrderId,
    machine: MachineId,
    details: WorkOrderDetails,
    creator: Option<UserId>,
    created_at: DateTime<Utc>,
}

impl PendingWorkOrder {
    /// Prepares a new draft for `machine`.
    #[must_use]
    pub fn new(
        machine: MachineId,
        details: WorkOrderDetails,
        creator: Option<UserId>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: WorkOrderId::new(),
            machine,
            details,
            creator,
            created_at: clock.utc(),
        }
    }

    /// Returns the identifier the order will carry.
    #[must_use]
    pub const fn id(&self) -> WorkOrderId {
        self.id
    }

    /// Returns the machine the order is raised against.
    #[must_use]
    pub const fn machine(&self) -> MachineId {
        self.machine
    }

    /// Returns the descriptive fields.
    #[must_use]
    pub const fn details(&self) -> &WorkOrderDetails {
        &self.details
    }

    /// Returns the creator, if any.
    #[must_use]
    pub const fn creator(&self) -> Option<UserId> {
        self.creator
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Turns the draft into a numbered work order.
    #[must_use]
    pub fn into_numbered(self, numbers: WorkOrderNumbers) -> WorkOrder {
        WorkOrder {
            id: self.id,
            numbers,
            machine: self.machine,
            details: self.details,
            status: WorkOrderStatus::Draft,
            creator: self.creator,
            reviewer: None,
            approver: None,
            responsible: None,
            authorizer: None,
            started_at: None,
            ended_at: None,
            execution_detail: None,
            spare_parts: Vec::new(),
            personnel_hours: Vec::new(),
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Work-order aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkOrder {
    id: WorkOrderId,
    numbers: WorkOrderNumbers,
    machine: MachineId,
    details: WorkOrderDetails,
    status: WorkOrderStatus,
    creator: Option<UserId>,
    reviewer: Option<UserId>,
    approver: Option<UserId>,
    responsible: Option<UserId>,
    authorizer: Option<UserId>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    execution_detail: Option<ExecutionDetail>,
    spare_parts: Vec<SparePartUsage>,
    personnel_hours: Vec<PersonnelHours>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted work order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedWorkOrderData {
    /// Persisted identifier.
    pub id: WorkOrderId,
    /// Persisted sequential numbers.
    pub numbers: WorkOrderNumbers,
    /// Persisted machine reference.
    pub machine: MachineId,
    /// Persisted descriptive fields.
    pub details: WorkOrderDetails,
    /// Persisted lifecycle status.
    pub status: WorkOrderStatus,
    /// Persisted creator.
    pub creator: Option<UserId>,
    /// Persisted reviewer.
    pub reviewer: Option<UserId>,
    /// Persisted approver.
    pub approver: Option<UserId>,
    /// Persisted execution responsible.
    pub responsible: Option<UserId>,
    /// Persisted authorizer.
    pub authorizer: Option<UserId>,
    /// Persisted execution start.
    pub started_at: Option<DateTime<Utc>>,
    /// Persisted execution end.
    pub ended_at: Option<DateTime<Utc>>,
    /// Persisted execution detail.
    pub execution_detail: Option<ExecutionDetail>,
    /// Persisted spare part lines.
    pub spare_parts: Vec<SparePartUsage>,
    /// Persisted personnel lines.
    pub personnel_hours: Vec<PersonnelHours>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
}

impl WorkOrder {
    /// Reconstructs a work order from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedWorkOrderData) -> Self {
        Self {
            id: data.id,
            numbers: data.numbers,
            machine: data.machine,
            details: data.details,
            status: data.status,
            creator: data.creator,
            reviewer: data.reviewer,
            approver: data.approver,
            responsible: data.responsible,
            authorizer: data.authorizer,
            started_at: data.started_at,
            ended_at: data.ended_at,
            execution_detail: data.execution_detail,
            spare_parts: data.spare_parts,
            personnel_hours: data.personnel_hours,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the identifier.
    #[must_use]
    pub const fn id(&self) -> WorkOrderId {
        self.id
    }

    /// Returns the sequential numbers.
    #[must_use]
    pub const fn numbers(&self) -> WorkOrderNumbers {
        self.numbers
    }

    /// Returns the machine the order belongs to.
    #[must_use]
    pub const fn machine(&self) -> MachineId {
        self.machine
    }

    /// Returns the descriptive fields.
    #[must_use]
    pub const fn details(&self) -> &WorkOrderDetails {
        &self.details
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        self.details.title()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> WorkOrderStatus {
        self.status
    }

    /// Returns the creator, if any.
    #[must_use]
    pub const fn creator(&self) -> Option<UserId> {
        self.creator
    }

    /// Returns the reviewer, if the review has been signed.
    #[must_use]
    pub const fn reviewer(&self) -> Option<UserId> {
        self.reviewer
    }

    /// Returns the final approver, if any.
    #[must_use]
    pub const fn approver(&self) -> Option<UserId> {
        self.approver
    }

    /// Returns the execution responsible, if assigned.
    #[must_use]
    pub const fn responsible(&self) -> Option<UserId> {
        self.responsible
    }

    /// Returns who authorized the order, if anyone.
    #[must_use]
    pub const fn authorizer(&self) -> Option<UserId> {
        self.authorizer
    }

    /// Returns when execution started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Returns when execution ended.
    #[must_use]
    pub const fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// Returns the execution detail, if one has been recorded.
    #[must_use]
    pub const fn execution_detail(&self) -> Option<&ExecutionDetail> {
        self.execution_detail.as_ref()
    }

    /// Returns the spare parts used.
    #[must_use]
    pub fn spare_parts(&self) -> &[SparePartUsage] {
        &self.spare_parts
    }

    /// Returns the labour logged.
    #[must_use]
    pub fn personnel_hours(&self) -> &[PersonnelHours] {
        &self.personnel_hours
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

    /// Returns `true` when `actor` created the order.
    #[must_use]
    pub fn is_created_by(&self, actor: &Actor) -> bool {
        self.creator.is_some_and(|user| actor.is(user))
    }

    /// Returns `true` when `actor` is the execution responsible.
    #[must_use]
    pub fn is_assigned_to(&self, actor: &Actor) -> bool {
        self.responsible.is_some_and(|user| actor.is(user))
    }

    /// Applies a lifecycle transition performed by `actor`.
    ///
    /// Only the transition guard is checked here; who may invoke the
    /// transition is decided by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`WorkOrderDomainError::NotEligible`] and leaves the order
    /// untouched when the guard rejects the current state.
    pub fn apply(
        &mut self,
        transition: &WorkOrderTransition,
        actor: &Actor,
        clock: &impl Clock,
    ) -> Result<(), WorkOrderDomainError> {
        if !transition.guard().admits(self) {
            return Err(WorkOrderDomainError::NotEligible {
                id: self.id,
                transition: transition.name(),
                status: self.status,
            });
        }

        let now = clock.utc();
        match *transition {
            WorkOrderTransition::SubmitRequest => {
                self.creator = self.creator.or(Some(actor.id()));
            }
            WorkOrderTransition::AssignResponsible { responsible } => {
                self.responsible = Some(responsible);
                self.authorizer = Some(actor.id());
            }
            WorkOrderTransition::StartExecution => self.started_at = Some(now),
            WorkOrderTransition::SubmitForReview => {
                self.ended_at = Some(now);
                if let Some(detail) = self.execution_detail.as_mut() {
                    detail.sign(clock);
                }
            }
            WorkOrderTransition::ReviewApprove | WorkOrderTransition::ReviewReject => {
                self.reviewer = Some(actor.id());
            }
            WorkOrderTransition::ApproveFinal => {
                self.approver = Some(actor.id());
                self.ended_at = self.ended_at.or(Some(now));
            }
            WorkOrderTransition::RejectApproval => self.approver = None,
            WorkOrderTransition::Close => self.ended_at = self.ended_at.or(Some(now)),
            WorkOrderTransition::Reopen => self.reset_sign_offs(),
        }
        self.status = transition.target();
        self.updated_at = now;
        Ok(())
    }

    fn reset_sign_offs(&mut self) {
        self.reviewer = None;
        self.approver = None;
        self.authorizer = None;
        self.responsible = None;
        self.started_at = None;
        self.ended_at = None;
        self.execution_detail = None;
    }

    /// Replaces the descriptive fields.
    pub fn update_details(&mut self, details: WorkOrderDetails, clock: &impl Clock) {
        self.details = details;
        self.touch(clock);
    }

    /// Gets or creates the execution detail and applies `update` to it.
    ///
    /// A newly created detail is executed by the authorizer unless the
    /// update names someone else.
    pub fn record_execution(&mut self, update: ExecutionDetailUpdate, clock: &impl Clock) {
        let authorizer = self.authorizer;
        self.execution_detail
            .get_or_insert_with(|| ExecutionDetail::new(authorizer))
            .apply(update);
        self.touch(clock);
    }

    /// Appends a spare part line.
    pub fn add_spare_part(&mut self, part: SparePartUsage, clock: &impl Clock) {
        self.spare_parts.push(part);
        self.touch(clock);
    }

    /// Appends a personnel-hours line.
    pub fn add_personnel_hours(&mut self, entry: PersonnelHours, clock: &impl Clock) {
        self.personnel_hours.push(entry);
        self.touch(clock);
    }

    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
