//! Repository doubles that hold calls open long enough for a competing
//! caller to run in between.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use odt_control::{
    machinery::{
        adapters::memory::InMemoryMachineRepository,
        domain::{Machine, MachineCode, MachineId, MachineState, MachineStateChange},
        ports::{
            MachineFilter, MachineRepository, MachineRepositoryResult, MachineStateObserver,
            ObserverError,
        },
    },
    work_order::{
        adapters::memory::InMemoryWorkOrderRepository,
        domain::{PendingWorkOrder, TransitionGuard, WorkOrder, WorkOrderId},
        ports::{WorkOrderCounts, WorkOrderFilter, WorkOrderRepository, WorkOrderRepositoryResult},
    },
};
use tokio::sync::Notify;

/// How long a held call stays open.
pub const HOLD: Duration = Duration::from_millis(150);

/// Work-order repository whose draft inserts and open-order checks wait
/// before reaching the store.
#[derive(Debug, Default)]
pub struct SlowDrafts {
    pub inner: InMemoryWorkOrderRepository,
    pub entered: Notify,
}

#[async_trait]
impl WorkOrderRepository for SlowDrafts {
    async fn insert_numbered(
        &self,
        pending: PendingWorkOrder,
    ) -> WorkOrderRepositoryResult<WorkOrder> {
        self.inner.insert_numbered(pending).await
    }

    async fn insert_numbered_unless_open(
        &self,
        pending: PendingWorkOrder,
        since: DateTime<Utc>,
    ) -> WorkOrderRepositoryResult<Option<WorkOrder>> {
        self.entered.notify_one();
        tokio::time::sleep(HOLD).await;
        self.inner.insert_numbered_unless_open(pending, since).await
    }

    async fn update_guarded(
        &self,
        order: &WorkOrder,
        guard: &TransitionGuard,
    ) -> WorkOrderRepositoryResult<bool> {
        self.inner.update_guarded(order, guard).await
    }

    async fn update(&self, order: &WorkOrder) -> WorkOrderRepositoryResult<()> {
        self.inner.update(order).await
    }

    async fn find_by_id(&self, id: WorkOrderId) -> WorkOrderRepositoryResult<Option<WorkOrder>> {
        self.inner.find_by_id(id).await
    }

    async fn list(&self, filter: &WorkOrderFilter) -> WorkOrderRepositoryResult<Vec<WorkOrder>> {
        self.inner.list(filter).await
    }

    async fn exists_open_for_machine_since(
        &self,
        machine: MachineId,
        since: DateTime<Utc>,
    ) -> WorkOrderRepositoryResult<bool> {
        tokio::time::sleep(HOLD).await;
        self.inner.exists_open_for_machine_since(machine, since).await
    }

    async fn status_counts(&self) -> WorkOrderRepositoryResult<WorkOrderCounts> {
        self.inner.status_counts().await
    }
}

/// Machine repository that, once armed, returns the next lookup only after
/// holding it open. The caller therefore acts on a snapshot that may have
/// gone stale in the meantime.
#[derive(Debug, Default)]
pub struct StaleLookups {
    pub inner: InMemoryMachineRepository,
    armed: AtomicBool,
    pub holding: Notify,
}

impl StaleLookups {
    /// Holds the next `find_by_id` open after it has read the store.
    pub fn hold_next_lookup(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl MachineRepository for StaleLookups {
    async fn store(&self, machine: &Machine) -> MachineRepositoryResult<()> {
        self.inner.store(machine).await
    }

    async fn update(&self, machine: &Machine) -> MachineRepositoryResult<()> {
        self.inner.update(machine).await
    }

    async fn update_state(
        &self,
        machine: &Machine,
        expected: MachineState,
    ) -> MachineRepositoryResult<bool> {
        self.inner.update_state(machine, expected).await
    }

    async fn find_by_id(&self, id: MachineId) -> MachineRepositoryResult<Option<Machine>> {
        let found = self.inner.find_by_id(id).await?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.holding.notify_one();
            tokio::time::sleep(HOLD).await;
        }
        Ok(found)
    }

    async fn find_by_code(&self, code: &MachineCode) -> MachineRepositoryResult<Option<Machine>> {
        self.inner.find_by_code(code).await
    }

    async fn list(&self, filter: &MachineFilter) -> MachineRepositoryResult<Vec<Machine>> {
        self.inner.list(filter).await
    }
}

/// Observer keeping every state change it is told about.
#[derive(Debug, Default)]
pub struct ChangeLog {
    changes: Mutex<Vec<MachineStateChange>>,
}

impl ChangeLog {
    /// Returns `(previous, current)` for every change seen so far.
    pub fn transitions(&self) -> Vec<(Option<MachineState>, MachineState)> {
        self.changes
            .lock()
            .map(|changes| {
                changes
                    .iter()
                    .map(|change| (change.previous(), change.current()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl MachineStateObserver for ChangeLog {
    async fn on_state_changed(
        &self,
        _machine: &Machine,
        change: &MachineStateChange,
    ) -> Result<(), ObserverError> {
        if let Ok(mut changes) = self.changes.lock() {
            changes.push(*change);
        }
        Ok(())
    }
}
