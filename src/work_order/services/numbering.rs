//! Retry loop around the numbering allocator.

use crate::work_order::{
    domain::{PendingWorkOrder, WorkOrder},
    ports::{WorkOrderRepository, WorkOrderRepositoryError, WorkOrderRepositoryResult},
};
use std::future::Future;
use tracing::debug;

/// Retries after a numbering collision when no setting overrides it.
pub const DEFAULT_NUMBERING_RETRIES: u32 = 3;

/// Inserts `pending`, retrying up to `retries` times when the allocated
/// numbers collide with a concurrent insert.
pub(crate) async fn insert_with_retry<W>(
    work_orders: &W,
    pending: PendingWorkOrder,
    retries: u32,
) -> WorkOrderRepositoryResult<WorkOrder>
where
    W: WorkOrderRepository + ?Sized,
{
    retry_numbering(&pending, retries, move |attempt| {
        work_orders.insert_numbered(attempt)
    })
    .await
}

/// Runs `insert` with a copy of `pending`, repeating it while the
/// allocated numbers collide and fewer than `retries` retries were spent.
pub(crate) async fn retry_numbering<T, F, Fut>(
    pending: &PendingWorkOrder,
    retries: u32,
    mut insert: F,
) -> WorkOrderRepositoryResult<T>
where
    F: FnMut(PendingWorkOrder) -> Fut,
    Fut: Future<Output = WorkOrderRepositoryResult<T>>,
{
    let mut attempt: u32 = 0;
    loop {
        match insert(pending.clone()).await {
            Err(WorkOrderRepositoryError::DuplicateNumber(numbers)) if attempt < retries => {
                attempt += 1;
                debug!(
                    work_order_id = %pending.id(),
                    correlative = %numbers.correlative(),
                    odt_number = %numbers.odt_number(),
                    attempt,
                    "work order numbers collided, retrying"
                );
            }
            result => return result,
        }
    }
}
