//! Port contracts for authorization.

pub mod capability;

pub use capability::CapabilityProvider;
