//! Domain model for actors and capabilities.

mod actor;
mod capability;
mod error;
mod ids;
mod role;

pub use actor::Actor;
pub use capability::Capability;
pub use error::{AccessDomainError, ParseCapabilityError};
pub use ids::UserId;
pub use role::RoleName;
