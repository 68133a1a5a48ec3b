//! Application services for the work-order lifecycle.

mod numbering;
mod query;
mod tracker;
mod workflow;

pub use numbering::DEFAULT_NUMBERING_RETRIES;
pub use query::{Inbox, QueryError, QueryResult, WorkOrderQueryService};
pub use tracker::{
    AutoDraftPolicy, DEFAULT_DESCRIPTION_TEMPLATE, DEFAULT_TITLE_TEMPLATE, MachineStateTracker,
};
pub use workflow::{
    CreateWorkOrderRequest, TransitionOutcome, WorkOrderWorkflowService, WorkflowError,
    WorkflowResult,
};
