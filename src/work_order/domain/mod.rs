//! Domain model for the work-order (ODT) lifecycle.
//!
//! A work order is raised against a machine, numbered once on first
//! persistence and moved through its lifecycle only by
//! [`WorkOrderTransition`]s.

mod error;
mod execution;
mod ids;
mod status;
mod transition;
mod work_order;

pub use error::{ParseWorkOrderFieldError, ParseWorkOrderStatusError, WorkOrderDomainError};
pub use execution::{
    ExecutionDetail, ExecutionDetailUpdate, FailureCategory, PersonnelHours, SparePartUsage,
};
pub use ids::{Correlative, OdtNumber, WorkOrderId, WorkOrderNumbers};
pub use status::{Priority, WorkOrderStatus, WorkType};
pub use transition::{Party, Presence, Requirement, TransitionGuard, WorkOrderTransition};
pub use work_order::{
    PendingWorkOrder, PersistedWorkOrderData, ReportFile, WorkOrder, WorkOrderDetails,
};
