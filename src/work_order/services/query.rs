//! Read-side queries: per-actor inbox, listing and statistics.

use crate::access::{
    domain::{Actor, Capability, UserId},
    ports::CapabilityProvider,
};
use crate::work_order::{
    domain::{Presence, WorkOrder, WorkOrderStatus},
    ports::{WorkOrderCounts, WorkOrderFilter, WorkOrderRepository, WorkOrderRepositoryError},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Work orders waiting on one actor, grouped by the action they need.
///
/// Each list is empty when the actor lacks the capability that action
/// requires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inbox {
    /// Requests waiting for an execution responsible.
    pub to_authorize: Vec<WorkOrder>,
    /// Orders in review without a reviewer.
    pub to_review: Vec<WorkOrder>,
    /// Reviewed orders waiting for final approval.
    pub to_approve: Vec<WorkOrder>,
    /// Assigned or running orders the actor is responsible for.
    pub assigned_to_me: Vec<WorkOrder>,
    /// Drafts the actor created.
    pub my_drafts: Vec<WorkOrder>,
}

impl Inbox {
    /// Returns the number of orders across every list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.to_authorize.len()
            + self.to_review.len()
            + self.to_approve.len()
            + self.assigned_to_me.len()
            + self.my_drafts.len()
    }

    /// Returns `true` when nothing is waiting on the actor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Service-level errors for work-order queries.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The actor lacks the capability the query requires.
    #[error("{actor} lacks capability {capability}")]
    Unauthorized {
        /// Refused actor.
        actor: UserId,
        /// Missing capability.
        capability: Capability,
    },

    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] WorkOrderRepositoryError),
}

/// Result type for work-order queries.
pub type QueryResult<T> = Result<T, QueryError>;

/// Work-order query service.
pub struct WorkOrderQueryService<W>
where
    W: WorkOrderRepository,
{
    work_orders: Arc<W>,
    capabilities: Arc<dyn CapabilityProvider>,
}

impl<W> WorkOrderQueryService<W>
where
    W: WorkOrderRepository,
{
    /// Creates a query service.
    #[must_use]
    pub fn new(work_orders: Arc<W>, capabilities: Arc<dyn CapabilityProvider>) -> Self {
        Self {
            work_orders,
            capabilities,
        }
    }

    /// Builds the actor's pending-action lists from current state.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Repository`] when a query fails.
    pub async fn inbox(&self, actor: &Actor) -> QueryResult<Inbox> {
        let to_authorize = self
            .list_if(
                actor,
                Capability::AuthorizeOdt,
                WorkOrderFilter::with_statuses([WorkOrderStatus::Request]),
            )
            .await?;
        let to_review = self
            .list_if(
                actor,
                Capability::ReviewOdt,
                WorkOrderFilter {
                    reviewer: Presence::Unset,
                    ..WorkOrderFilter::with_statuses([WorkOrderStatus::InReview])
                },
            )
            .await?;
        let to_approve = self
            .list_if(
                actor,
                Capability::ApproveOdt,
                WorkOrderFilter {
                    reviewer: Presence::Set,
                    approver: Presence::Unset,
                    ..WorkOrderFilter::with_statuses([WorkOrderStatus::InReview])
                },
            )
            .await?;
        let assigned_to_me = self
            .work_orders
            .list(&WorkOrderFilter {
                responsible: Some(actor.id()),
                ..WorkOrderFilter::with_statuses([
                    WorkOrderStatus::Assigned,
                    WorkOrderStatus::InExecution,
                ])
            })
            .await?;
        let my_drafts = self
            .work_orders
            .list(&WorkOrderFilter {
                creator: Some(actor.id()),
                ..WorkOrderFilter::with_statuses([WorkOrderStatus::Draft])
            })
            .await?;

        Ok(Inbox {
            to_authorize,
            to_review,
            to_approve,
            assigned_to_me,
            my_drafts,
        })
    }

    /// Lists work orders matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Repository`] when the query fails.
    pub async fn list(&self, filter: &WorkOrderFilter) -> QueryResult<Vec<WorkOrder>> {
        Ok(self.work_orders.list(filter).await?)
    }

    /// Counts work orders by status and priority.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Unauthorized`] without `view_stats` and
    /// [`QueryError::Repository`] when the query fails.
    pub async fn statistics(&self, actor: &Actor) -> QueryResult<WorkOrderCounts> {
        if !self
            .capabilities
            .actor_has_capability(actor, Capability::ViewStats)
        {
            warn!(actor = %actor.id(), "statistics denied");
            return Err(QueryError::Unauthorized {
                actor: actor.id(),
                capability: Capability::ViewStats,
            });
        }
        Ok(self.work_orders.status_counts().await?)
    }

    async fn list_if(
        &self,
        actor: &Actor,
        capability: Capability,
        filter: WorkOrderFilter,
    ) -> QueryResult<Vec<WorkOrder>> {
        if !self.capabilities.actor_has_capability(actor, capability) {
            return Ok(Vec::new());
        }
        Ok(self.work_orders.list(&filter).await?)
    }
}
