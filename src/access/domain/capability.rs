//! Named permissions gating work-order operations.

use super::ParseCapabilityError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A named permission granting authority over one kind of operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Create new work orders.
    CreateOdt,
    /// Authorize a requested work order and assign its responsible.
    AuthorizeOdt,
    /// Fill in execution data.
    ExecuteOdt,
    /// Review executed work.
    ReviewOdt,
    /// Give final approval to reviewed work.
    ApproveOdt,
    /// Edit every field of a work order regardless of ownership.
    EditFullOdt,
    /// Read work-order detail.
    ViewDetail,
    /// Submit a draft as a request.
    SendRequest,
    /// Read aggregate statistics.
    ViewStats,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::CreateOdt,
        Self::AuthorizeOdt,
        Self::ExecuteOdt,
        Self::ReviewOdt,
        Self::ApproveOdt,
        Self::EditFullOdt,
        Self::ViewDetail,
        Self::SendRequest,
        Self::ViewStats,
    ];

    /// Returns the canonical permission code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreateOdt => "create_odt",
            Self::AuthorizeOdt => "authorize_odt",
            Self::ExecuteOdt => "execute_odt",
            Self::ReviewOdt => "review_odt",
            Self::ApproveOdt => "approve_odt",
            Self::EditFullOdt => "edit_full_odt",
            Self::ViewDetail => "view_detail",
            Self::SendRequest => "send_request",
            Self::ViewStats => "view_stats",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Capability {
    type Error = ParseCapabilityError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|capability| capability.as_str() == normalized)
            .ok_or_else(|| ParseCapabilityError(value.to_owned()))
    }
}
