//! In-memory repository for work orders.
//!
//! Guards, numbering and the open-order check are evaluated under the
//! same write lock as the write itself.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::machinery::domain::MachineId;
use crate::work_order::{
    domain::{PendingWorkOrder, TransitionGuard, WorkOrder, WorkOrderId, WorkOrderNumbers},
    ports::{
        WorkOrderCounts, WorkOrderFilter, WorkOrderRepository, WorkOrderRepositoryError,
        WorkOrderRepositoryResult,
    },
};

/// Thread-safe in-memory work-order repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkOrderRepository {
    state: Arc<RwLock<InMemoryWorkOrderState>>,
}

#[derive(Debug, Default)]
struct InMemoryWorkOrderState {
    orders: HashMap<WorkOrderId, WorkOrder>,
}

impl InMemoryWorkOrderState {
    fn next_numbers(&self) -> WorkOrderRepositoryResult<WorkOrderNumbers> {
        let max_correlative = self
            .orders
            .values()
            .map(|order| order.numbers().correlative())
            .max();
        let max_odt_number = self
            .orders
            .values()
            .map(|order| order.numbers().odt_number())
            .max();
        WorkOrderNumbers::after(max_correlative, max_odt_number)
            .map_err(WorkOrderRepositoryError::persistence)
    }

    fn numbers_taken(&self, numbers: WorkOrderNumbers) -> bool {
        self.orders.values().any(|order| {
            order.numbers().correlative() == numbers.correlative()
                || order.numbers().odt_number() == numbers.odt_number()
        })
    }

    fn has_open_order(&self, machine: MachineId, since: DateTime<Utc>) -> bool {
        self.orders.values().any(|order| {
            order.machine() == machine && order.status().is_open() && order.created_at() >= since
        })
    }

    fn insert_pending(&mut self, pending: PendingWorkOrder) -> WorkOrderRepositoryResult<WorkOrder> {
        if self.orders.contains_key(&pending.id()) {
            return Err(WorkOrderRepositoryError::DuplicateWorkOrder(pending.id()));
        }
        let numbers = self.next_numbers()?;
        if self.numbers_taken(numbers) {
            return Err(WorkOrderRepositoryError::DuplicateNumber(numbers));
        }

        let order = pending.into_numbered(numbers);
        self.orders.insert(order.id(), order.clone());
        Ok(order)
    }

    fn stored(&self, id: WorkOrderId) -> WorkOrderRepositoryResult<&WorkOrder> {
        self.orders
            .get(&id)
            .ok_or(WorkOrderRepositoryError::NotFound(id))
    }
}

impl InMemoryWorkOrderRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(err: impl ToString) -> WorkOrderRepositoryError {
    WorkOrderRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl WorkOrderRepository for InMemoryWorkOrderRepository {
    async fn insert_numbered(
        &self,
        pending: PendingWorkOrder,
    ) -> WorkOrderRepositoryResult<WorkOrder> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.insert_pending(pending)
    }

    async fn insert_numbered_unless_open(
        &self,
        pending: PendingWorkOrder,
        since: DateTime<Utc>,
    ) -> WorkOrderRepositoryResult<Option<WorkOrder>> {
        let mut state = self.state.write().map_err(lock_error)?;
        if state.has_open_order(pending.machine(), since) {
            return Ok(None);
        }
        state.insert_pending(pending).map(Some)
    }

    async fn update_guarded(
        &self,
        order: &WorkOrder,
        guard: &TransitionGuard,
    ) -> WorkOrderRepositoryResult<bool> {
        let mut state = self.state.write().map_err(lock_error)?;
        if !guard.admits(state.stored(order.id())?) {
            return Ok(false);
        }
        state.orders.insert(order.id(), order.clone());
        Ok(true)
    }

    async fn update(&self, order: &WorkOrder) -> WorkOrderRepositoryResult<()> {
        let mut state = self.state.write().map_err(lock_error)?;
        state.stored(order.id())?;
        state.orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: WorkOrderId) -> WorkOrderRepositoryResult<Option<WorkOrder>> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.orders.get(&id).cloned())
    }

    async fn list(&self, filter: &WorkOrderFilter) -> WorkOrderRepositoryResult<Vec<WorkOrder>> {
        let state = self.state.read().map_err(lock_error)?;
        let mut orders: Vec<WorkOrder> = state
            .orders
            .values()
            .filter(|order| filter.matches(order))
            .cloned()
            .collect();
        orders.sort_by(|left, right| {
            right
                .created_at()
                .cmp(&left.created_at())
                .then_with(|| right.numbers().correlative().cmp(&left.numbers().correlative()))
        });
        Ok(orders)
    }

    async fn exists_open_for_machine_since(
        &self,
        machine: MachineId,
        since: DateTime<Utc>,
    ) -> WorkOrderRepositoryResult<bool> {
        let state = self.state.read().map_err(lock_error)?;
        Ok(state.has_open_order(machine, since))
    }

    async fn status_counts(&self) -> WorkOrderRepositoryResult<WorkOrderCounts> {
        let state = self.state.read().map_err(lock_error)?;
        let mut counts = WorkOrderCounts::default();
        for order in state.orders.values() {
            counts.add(order.status(), order.details().priority(), 1);
        }
        Ok(counts)
    }
}
