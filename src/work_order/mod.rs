//! Maintenance work orders (ODT) and their lifecycle.
//!
//! Work orders are raised by hand or automatically when a machine enters a
//! trigger state, numbered once on first persistence and then moved through
//! a role-gated state machine from draft to closure. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
