//! Port contracts for work-order persistence.

pub mod repository;

pub use repository::{
    WorkOrderCounts, WorkOrderFilter, WorkOrderRepository, WorkOrderRepositoryError,
    WorkOrderRepositoryResult,
};
