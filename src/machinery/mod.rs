//! Machine registry and operational-state tracking.
//!
//! Machines carry an operational state. Every committed state change is
//! published to registered [`ports::MachineStateObserver`] hooks, which is
//! how work orders get raised automatically without this module knowing
//! anything about work orders. The module follows hexagonal architecture:
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
