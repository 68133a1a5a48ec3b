//! The work-order state machine.
//!
//! Every lifecycle move is one [`WorkOrderTransition`] variant. A variant
//! declares where it may start ([`TransitionGuard`]), where it lands and who
//! may invoke it ([`Requirement`]). Storage adapters re-check the guard
//! atomically with the write, so two callers racing for the same move
//! cannot both succeed.

use super::{WorkOrder, WorkOrderStatus};
use crate::access::domain::{Actor, Capability, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Required presence of an optional sign-off field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Presence {
    /// Field may be set or unset.
    #[default]
    Any,
    /// Field must be set.
    Set,
    /// Field must be unset.
    Unset,
}

impl Presence {
    /// Returns `true` when a field that `is_set` satisfies this rule.
    #[must_use]
    pub const fn admits(self, is_set: bool) -> bool {
        match self {
            Self::Any => true,
            Self::Set => is_set,
            Self::Unset => !is_set,
        }
    }
}

/// Precondition on the stored work order for a transition to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransitionGuard {
    from: &'static [WorkOrderStatus],
    reviewer: Presence,
    approver: Presence,
    needs_execution_detail: bool,
}

impl TransitionGuard {
    /// Guard admitting any of `from`, with no sign-off constraints.
    #[must_use]
    pub const fn for_statuses(from: &'static [WorkOrderStatus]) -> Self {
        Self {
            from,
            reviewer: Presence::Any,
            approver: Presence::Any,
            needs_execution_detail: false,
        }
    }

    const fn reviewer(mut self, presence: Presence) -> Self {
        self.reviewer = presence;
        self
    }

    const fn approver(mut self, presence: Presence) -> Self {
        self.approver = presence;
        self
    }

    const fn with_execution_detail(mut self) -> Self {
        self.needs_execution_detail = true;
        self
    }

    /// Returns the statuses the transition may start from.
    #[must_use]
    pub const fn source_statuses(&self) -> &'static [WorkOrderStatus] {
        self.from
    }

    /// Returns the reviewer presence rule.
    #[must_use]
    pub const fn reviewer_presence(&self) -> Presence {
        self.reviewer
    }

    /// Returns the approver presence rule.
    #[must_use]
    pub const fn approver_presence(&self) -> Presence {
        self.approver
    }

    /// Returns `true` when an execution detail must already exist.
    #[must_use]
    pub const fn needs_execution_detail(&self) -> bool {
        self.needs_execution_detail
    }

    /// Returns `true` when `order` satisfies the guard.
    #[must_use]
    pub fn admits(&self, order: &WorkOrder) -> bool {
        self.from.contains(&order.status())
            && self.reviewer.admits(order.reviewer().is_some())
            && self.approver.admits(order.approver().is_some())
            && (!self.needs_execution_detail || order.execution_detail().is_some())
    }
}

/// A party identified on the work order itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Party {
    /// The user who created the order.
    Creator,
    /// The creator, or anyone when the order has no creator yet.
    CreatorOrUnclaimed,
    /// The assigned execution responsible.
    ExecutionResponsible,
}

impl Party {
    /// Returns `true` when `actor` is this party on `order`.
    #[must_use]
    pub fn matches(self, order: &WorkOrder, actor: &Actor) -> bool {
        match self {
            Self::Creator => order.creator().is_some_and(|user| actor.is(user)),
            Self::CreatorOrUnclaimed => order.creator().is_none_or(|user| actor.is(user)),
            Self::ExecutionResponsible => order.responsible().is_some_and(|user| actor.is(user)),
        }
    }

    /// Returns a short label for messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Creator | Self::CreatorOrUnclaimed => "creator",
            Self::ExecutionResponsible => "execution responsible",
        }
    }
}

/// Who may invoke a transition.
///
/// The capability, when present, is always required. The party, when
/// present, must match unless the actor holds the override capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Requirement {
    capability: Option<Capability>,
    party: Option<Party>,
    party_override: Option<Capability>,
}

impl Requirement {
    /// Requires a capability.
    #[must_use]
    pub const fn capability(capability: Capability) -> Self {
        Self {
            capability: Some(capability),
            party: None,
            party_override: None,
        }
    }

    /// Requires being a party on the order.
    #[must_use]
    pub const fn party(party: Party) -> Self {
        Self {
            capability: None,
            party: Some(party),
            party_override: None,
        }
    }

    /// Additionally requires being a party on the order.
    #[must_use]
    pub const fn and_party(mut self, party: Party) -> Self {
        self.party = Some(party);
        self
    }

    /// Lets holders of `capability` skip the party check.
    #[must_use]
    pub const fn or_capability(mut self, capability: Capability) -> Self {
        self.party_override = Some(capability);
        self
    }

    /// Returns the capability every caller must hold.
    #[must_use]
    pub const fn required_capability(&self) -> Option<Capability> {
        self.capability
    }

    /// Returns the party the caller must be.
    #[must_use]
    pub const fn required_party(&self) -> Option<Party> {
        self.party
    }

    /// Returns the capability that waives the party check.
    #[must_use]
    pub const fn party_override(&self) -> Option<Capability> {
        self.party_override
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(capability) = self.capability {
            parts.push(format!("capability {capability}"));
        }
        match (self.party, self.party_override) {
            (Some(party), Some(capability)) => {
                parts.push(format!("{} or capability {capability}", party.as_str()));
            }
            (Some(party), None) => parts.push(party.as_str().to_owned()),
            (None, _) => {}
        }
        f.write_str(&parts.join(" and "))
    }
}

/// A lifecycle move of a work order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkOrderTransition {
    /// Creator submits the draft for authorization.
    SubmitRequest,
    /// An authorizer assigns the execution responsible.
    AssignResponsible {
        /// User who will carry out the work.
        responsible: UserId,
    },
    /// The execution responsible starts work.
    StartExecution,
    /// The execution responsible hands the work in for review.
    SubmitForReview,
    /// A reviewer signs the review off; final approval is still pending.
    ReviewApprove,
    /// A reviewer rejects the work.
    ReviewReject,
    /// An area manager approves the reviewed work.
    ApproveFinal,
    /// An area manager rejects the reviewed work.
    RejectApproval,
    /// An approved order is closed.
    Close,
    /// A rejected order goes back to draft.
    Reopen,
}

const DRAFT: &[WorkOrderStatus] = &[WorkOrderStatus::Draft];
const REQUEST: &[WorkOrderStatus] = &[WorkOrderStatus::Request];
const ASSIGNED: &[WorkOrderStatus] = &[WorkOrderStatus::Assigned];
const IN_EXECUTION: &[WorkOrderStatus] = &[WorkOrderStatus::InExecution];
const IN_REVIEW: &[WorkOrderStatus] = &[WorkOrderStatus::InReview];
const APPROVED: &[WorkOrderStatus] = &[WorkOrderStatus::Approved];
const REJECTED: &[WorkOrderStatus] = &[
    WorkOrderStatus::RejectedAtReview,
    WorkOrderStatus::RejectedAtApproval,
];

impl WorkOrderTransition {
    /// Returns the operation name used in logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SubmitRequest => "submit_request",
            Self::AssignResponsible { .. } => "assign_responsible",
            Self::StartExecution => "start_execution",
            Self::SubmitForReview => "submit_for_review",
            Self::ReviewApprove => "review_approve",
            Self::ReviewReject => "review_reject",
            Self::ApproveFinal => "approve_final",
            Self::RejectApproval => "reject_approval",
            Self::Close => "close",
            Self::Reopen => "reopen",
        }
    }

    /// Returns the precondition on the stored order.
    #[must_use]
    pub const fn guard(&self) -> TransitionGuard {
        match self {
            Self::SubmitRequest => TransitionGuard::for_statuses(DRAFT),
            Self::AssignResponsible { .. } => TransitionGuard::for_statuses(REQUEST),
            Self::StartExecution => TransitionGuard::for_statuses(ASSIGNED),
            Self::SubmitForReview => TransitionGuard::for_statuses(IN_EXECUTION).with_execution_detail(),
            Self::ReviewApprove | Self::ReviewReject => {
                TransitionGuard::for_statuses(IN_REVIEW).reviewer(Presence::Unset)
            }
            Self::ApproveFinal | Self::RejectApproval => TransitionGuard::for_statuses(IN_REVIEW)
                .reviewer(Presence::Set)
                .approver(Presence::Unset),
            Self::Close => TransitionGuard::for_statuses(APPROVED),
            Self::Reopen => TransitionGuard::for_statuses(REJECTED),
        }
    }

    /// Returns the status the order lands in.
    #[must_use]
    pub const fn target(&self) -> WorkOrderStatus {
        match self {
            Self::SubmitRequest => WorkOrderStatus::Request,
            Self::AssignResponsible { .. } => WorkOrderStatus::Assigned,
            Self::StartExecution => WorkOrderStatus::InExecution,
            Self::SubmitForReview | Self::ReviewApprove => WorkOrderStatus::InReview,
            Self::ReviewReject => WorkOrderStatus::RejectedAtReview,
            Self::ApproveFinal => WorkOrderStatus::Approved,
            Self::RejectApproval => WorkOrderStatus::RejectedAtApproval,
            Self::Close => WorkOrderStatus::Closed,
            Self::Reopen => WorkOrderStatus::Draft,
        }
    }

    /// Returns who may invoke the transition.
    #[must_use]
    pub const fn requirement(&self) -> Requirement {
        match self {
            Self::SubmitRequest => Requirement::capability(Capability::SendRequest)
                .and_party(Party::CreatorOrUnclaimed),
            Self::AssignResponsible { .. } => Requirement::capability(Capability::AuthorizeOdt),
            Self::StartExecution | Self::SubmitForReview => {
                Requirement::capability(Capability::ExecuteOdt)
                    .and_party(Party::ExecutionResponsible)
            }
            Self::ReviewApprove | Self::ReviewReject => {
                Requirement::capability(Capability::ReviewOdt)
            }
            Self::ApproveFinal | Self::RejectApproval | Self::Close => {
                Requirement::capability(Capability::ApproveOdt)
            }
            Self::Reopen => {
                Requirement::party(Party::Creator).or_capability(Capability::EditFullOdt)
            }
        }
    }
}

impl fmt::Display for WorkOrderTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
