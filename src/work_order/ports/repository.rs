//! Repository port for work-order numbering, guarded transitions and
//! queries.

use crate::access::domain::UserId;
use crate::machinery::domain::MachineId;
use crate::work_order::domain::{
    PendingWorkOrder, Presence, Priority, TransitionGuard, WorkOrder, WorkOrderId,
    WorkOrderNumbers, WorkOrderStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

/// Result type for work-order repository operations.
pub type WorkOrderRepositoryResult<T> = Result<T, WorkOrderRepositoryError>;

/// Filter applied when listing work orders. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkOrderFilter {
    /// Only orders in one of these statuses. Empty matches all.
    pub statuses: Vec<WorkOrderStatus>,
    /// Only orders raised against this machine.
    pub machine: Option<MachineId>,
    /// Only orders with this priority.
    pub priority: Option<Priority>,
    /// Only orders created by this user.
    pub creator: Option<UserId>,
    /// Only orders assigned to this user.
    pub responsible: Option<UserId>,
    /// Reviewer presence.
    pub reviewer: Presence,
    /// Approver presence.
    pub approver: Presence,
    /// Only orders created at or after this instant.
    pub created_since: Option<DateTime<Utc>>,
    /// Case-insensitive text contained in title or description.
    pub text: Option<String>,
}

impl WorkOrderFilter {
    /// Filter matching orders in any of `statuses`.
    #[must_use]
    pub fn with_statuses(statuses: impl IntoIterator<Item = WorkOrderStatus>) -> Self {
        Self {
            statuses: statuses.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Returns `true` when the order satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, order: &WorkOrder) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&order.status()) {
            return false;
        }
        if self.machine.is_some_and(|machine| order.machine() != machine) {
            return false;
        }
        if self
            .priority
            .is_some_and(|priority| order.details().priority() != priority)
        {
            return false;
        }
        if self.creator.is_some_and(|user| order.creator() != Some(user)) {
            return false;
        }
        if self
            .responsible
            .is_some_and(|user| order.responsible() != Some(user))
        {
            return false;
        }
        if !self.reviewer.admits(order.reviewer().is_some())
            || !self.approver.admits(order.approver().is_some())
        {
            return false;
        }
        if self
            .created_since
            .is_some_and(|since| order.created_at() < since)
        {
            return false;
        }
        self.text.as_deref().is_none_or(|text| {
            let needle = text.trim().to_lowercase();
            order.title().to_lowercase().contains(&needle)
                || order.details().description().to_lowercase().contains(&needle)
        })
    }
}

/// Work-order tallies used for statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkOrderCounts {
    /// Number of orders per status. Statuses without orders are absent.
    pub by_status: BTreeMap<WorkOrderStatus, u64>,
    /// Number of orders per priority. Priorities without orders are absent.
    pub by_priority: BTreeMap<Priority, u64>,
}

impl WorkOrderCounts {
    /// Adds `count` orders sharing a status and priority.
    pub fn add(&mut self, status: WorkOrderStatus, priority: Priority, count: u64) {
        *self.by_status.entry(status).or_insert(0) += count;
        *self.by_priority.entry(priority).or_insert(0) += count;
    }

    /// Returns the number of orders in `status`.
    #[must_use]
    pub fn status(&self, status: WorkOrderStatus) -> u64 {
        self.by_status.get(&status).copied().unwrap_or_default()
    }

    /// Returns the number of orders with `priority`.
    #[must_use]
    pub fn priority(&self, priority: Priority) -> u64 {
        self.by_priority.get(&priority).copied().unwrap_or_default()
    }

    /// Returns the total number of orders counted.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.by_status.values().sum()
    }
}

/// Work-order persistence contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WorkOrderRepository: Send + Sync {
    /// Numbers and stores a new draft.
    ///
    /// Both sequential numbers are computed as the current maximum plus one
    /// within the same write.
    ///
    /// # Errors
    ///
    /// Returns [`WorkOrderRepositoryError::DuplicateNumber`] when the
    /// uniqueness guard on either number trips. Callers retry with a fresh
    /// read.
    async fn insert_numbered(&self, pending: PendingWorkOrder)
    -> WorkOrderRepositoryResult<WorkOrder>;

    /// Numbers and stores a new draft unless its machine already has an
    /// open order created at or after `since`.
    ///
    /// The check and the insert are atomic per machine: of two concurrent
    /// calls for the same machine at most one stores a draft. Returns
    /// `None` when an open order suppressed the insert.
    ///
    /// # Errors
    ///
    /// Same as [`WorkOrderRepository::insert_numbered`].
    async fn insert_numbered_unless_open(
        &self,
        pending: PendingWorkOrder,
        since: DateTime<Utc>,
    ) -> WorkOrderRepositoryResult<Option<WorkOrder>>;

    /// Writes `order` only if the stored record still satisfies `guard`.
    ///
    /// Returns `false` without writing when the guard no longer holds.
    ///
    /// # Errors
    ///
    /// Returns [`WorkOrderRepositoryError::NotFound`] when the order does
    /// not exist.
    async fn update_guarded(
        &self,
        order: &WorkOrder,
        guard: &TransitionGuard,
    ) -> WorkOrderRepositoryResult<bool>;

    /// Writes `order` unconditionally. Numbers are never rewritten.
    ///
    /// # Errors
    ///
    /// Returns [`WorkOrderRepositoryError::NotFound`] when the order does
    /// not exist.
    async fn update(&self, order: &WorkOrder) -> WorkOrderRepositoryResult<()>;

    /// Finds a work order by identifier.
    async fn find_by_id(&self, id: WorkOrderId) -> WorkOrderRepositoryResult<Option<WorkOrder>>;

    /// Lists work orders matching the filter, newest first.
    async fn list(&self, filter: &WorkOrderFilter) -> WorkOrderRepositoryResult<Vec<WorkOrder>>;

    /// Returns `true` when `machine` has an open order created at or after
    /// `since`.
    async fn exists_open_for_machine_since(
        &self,
        machine: MachineId,
        since: DateTime<Utc>,
    ) -> WorkOrderRepositoryResult<bool>;

    /// Counts all work orders by status and by priority.
    async fn status_counts(&self) -> WorkOrderRepositoryResult<WorkOrderCounts>;
}

/// Errors returned by work-order repository implementations.
#[derive(Debug, Clone, Error)]
pub enum WorkOrderRepositoryError {
    /// A work order with the same identifier already exists.
    #[error("duplicate work order identifier: {0}")]
    DuplicateWorkOrder(WorkOrderId),

    /// A sequential number is already taken.
    #[error(
        "work order numbers already taken: correlative {}, ODT {}",
        .0.correlative(),
        .0.odt_number()
    )]
    DuplicateNumber(WorkOrderNumbers),

    /// The work order was not found.
    #[error("work order not found: {0}")]
    NotFound(WorkOrderId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl WorkOrderRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
