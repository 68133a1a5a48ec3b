//! Actors, capabilities and role membership.
//!
//! Every work-order operation receives an explicit [`domain::Actor`] and
//! consults a [`ports::CapabilityProvider`] before mutating anything. The
//! crate never authenticates anyone: identities and role memberships are
//! supplied by the embedding application.
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]

pub mod adapters;
pub mod domain;
pub mod ports;

#[cfg(test)]
mod tests;
