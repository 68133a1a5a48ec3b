//! Port contracts for the machine registry.
//!
//! Ports define infrastructure-agnostic interfaces used by machinery
//! services.

pub mod observer;
pub mod repository;

pub use observer::{MachineStateObserver, ObserverError};
pub use repository::{
    MachineFilter, MachineRepository, MachineRepositoryError, MachineRepositoryResult,
    MachineTypeRepository, MachineTypeRepositoryError, MachineTypeRepositoryResult,
};
