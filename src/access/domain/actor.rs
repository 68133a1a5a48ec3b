//! The explicit caller of every operation.

use super::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Person invoking an operation.
///
/// Operations take the actor as a parameter; there is no ambient
/// "current user".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Actor {
    id: UserId,
    display_name: String,
}

impl Actor {
    /// Creates an actor.
    #[must_use]
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }

    /// Returns the actor's user identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the actor's display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Returns `true` when this actor is the given user.
    #[must_use]
    pub fn is(&self, user: UserId) -> bool {
        self.id == user
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_name, self.id)
    }
}
