//! Role (group) names.

use super::AccessDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Validated role name, normalised to trimmed lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(String);

impl RoleName {
    /// Role of people who raise and execute work orders.
    pub const OPERATOR: &'static str = "operator";
    /// Role of people who review executed work.
    pub const SUPERVISOR: &'static str = "supervisor";
    /// Role of people who give final approval.
    pub const AREA_MANAGER: &'static str = "area_manager";

    /// Creates a validated role name.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDomainError::EmptyRoleName`] when the value is blank.
    pub fn new(value: impl AsRef<str>) -> Result<Self, AccessDomainError> {
        let normalized = value.as_ref().trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(AccessDomainError::EmptyRoleName);
        }
        Ok(Self(normalized))
    }

    /// Returns the built-in operator role.
    #[must_use]
    pub fn operator() -> Self {
        Self(Self::OPERATOR.to_owned())
    }

    /// Returns the built-in supervisor role.
    #[must_use]
    pub fn supervisor() -> Self {
        Self(Self::SUPERVISOR.to_owned())
    }

    /// Returns the built-in area-manager role.
    #[must_use]
    pub fn area_manager() -> Self {
        Self(Self::AREA_MANAGER.to_owned())
    }

    /// Returns the role name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
