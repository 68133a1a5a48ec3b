//! Error types for work-order domain validation and parsing.

use super::{WorkOrderId, WorkOrderStatus};
use thiserror::Error;

/// Errors returned while constructing or mutating work-order values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkOrderDomainError {
    /// The title is empty after trimming.
    #[error("work order title must not be empty")]
    EmptyTitle,

    /// A sequential number is zero or exceeds the storage range.
    #[error("invalid work order number {0}, expected a positive integer")]
    InvalidNumber(u64),

    /// The work order is not in a state that allows the transition.
    #[error("work order {id} is not eligible for {transition} while {status}")]
    NotEligible {
        /// Work order that was addressed.
        id: WorkOrderId,
        /// Name of the attempted transition.
        transition: &'static str,
        /// Status observed when the guard was evaluated.
        status: WorkOrderStatus,
    },

    /// A spare part line has no description.
    #[error("spare part description must not be empty")]
    EmptySparePart,

    /// A spare part quantity is negative.
    #[error("spare part quantity must not be negative: {0}")]
    NegativeQuantity(rust_decimal::Decimal),

    /// A personnel-hours line names neither a category nor a worker.
    #[error("personnel entry needs a category or a worker")]
    EmptyPersonnelEntry,

    /// Logged hours are negative.
    #[error("personnel hours must not be negative: {0}")]
    NegativeHours(rust_decimal::Decimal),
}

/// Error returned while parsing work-order statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown work order status: {0}")]
pub struct ParseWorkOrderStatusError(pub String);

/// Error returned while parsing priorities, work types or failure
/// categories from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseWorkOrderFieldError {
    /// Field being parsed.
    pub kind: &'static str,
    /// Rejected raw value.
    pub value: String,
}
