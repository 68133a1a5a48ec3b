//! Work-order status, priority and work type.

use super::{ParseWorkOrderFieldError, ParseWorkOrderStatusError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkOrderStatus {
    /// Being prepared by its creator.
    Draft,
    /// Submitted for authorization.
    Request,
    /// An execution responsible has been assigned.
    Assigned,
    /// Work is under way.
    InExecution,
    /// Awaiting review and final approval.
    InReview,
    /// Approved by an area manager.
    Approved,
    /// Rejected by the reviewer.
    RejectedAtReview,
    /// Rejected at final approval.
    RejectedAtApproval,
    /// Closed for good.
    Closed,
}

impl WorkOrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 9] = [
        Self::Draft,
        Self::Request,
        Self::Assigned,
        Self::InExecution,
        Self::InReview,
        Self::Approved,
        Self::RejectedAtReview,
        Self::RejectedAtApproval,
        Self::Closed,
    ];

    /// Statuses that count as an open work order when deduplicating
    /// automatic drafts.
    pub const OPEN: [Self; 4] = [
        Self::Draft,
        Self::Assigned,
        Self::InExecution,
        Self::InReview,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Request => "REQUEST",
            Self::Assigned => "ASSIGNED",
            Self::InExecution => "IN_EXECUTION",
            Self::InReview => "IN_REVIEW",
            Self::Approved => "APPROVED",
            Self::RejectedAtReview => "REJECTED_AT_REVIEW",
            Self::RejectedAtApproval => "REJECTED_AT_APPROVAL",
            Self::Closed => "CLOSED",
        }
    }

    /// Returns `true` for statuses that suppress a new automatic draft.
    /// Orders waiting in `REQUEST` do not.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(
            self,
            Self::Draft | Self::Assigned | Self::InExecution | Self::InReview
        )
    }

    /// Returns `true` for statuses no forward transition leaves.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Closed | Self::RejectedAtReview | Self::RejectedAtApproval
        )
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WorkOrderStatus {
    type Error = ParseWorkOrderStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| ParseWorkOrderStatusError(value.to_owned()))
    }
}

/// Urgency of a work order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Can wait.
    Low,
    /// Normal scheduling.
    #[default]
    Medium,
    /// Schedule soon.
    High,
    /// Drop everything.
    Urgent,
}

impl Priority {
    /// Every priority, lowest first.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Priority {
    type Error = ParseWorkOrderFieldError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        parse_upper(value, &Self::ALL, Self::as_str, "priority")
    }
}

/// Kind of maintenance performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkType {
    /// Planned maintenance.
    #[default]
    Preventive,
    /// Repair after a fault.
    Corrective,
}

impl WorkType {
    /// Every work type.
    pub const ALL: [Self; 2] = [Self::Preventive, Self::Corrective];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Preventive => "PREVENTIVE",
            Self::Corrective => "CORRECTIVE",
        }
    }
}

impl fmt::Display for WorkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WorkType {
    type Error = ParseWorkOrderFieldError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        parse_upper(value, &Self::ALL, Self::as_str, "work type")
    }
}

/// Matches a case-insensitive storage code against a closed set of values.
pub(super) fn parse_upper<T: Copy>(
    value: &str,
    candidates: &[T],
    code: impl Fn(T) -> &'static str,
    kind: &'static str,
) -> Result<T, ParseWorkOrderFieldError> {
    let normalized = value.trim().to_ascii_uppercase();
    candidates
        .iter()
        .copied()
        .find(|candidate| code(*candidate) == normalized)
        .ok_or_else(|| ParseWorkOrderFieldError {
            kind,
            value: value.to_owned(),
        })
}
