//! Domain model for machines and their operational state.

mod error;
mod ids;
mod machine;
mod machine_type;
mod state;

pub use error::{MachineDomainError, ParseMachineStateError};
pub use ids::{MachineCode, MachineId, MachineTypeId};
pub use machine::{Machine, MachineDetails, PersistedMachineData};
pub use machine_type::{MachineType, PersistedMachineTypeData};
pub use state::{MachineState, MachineStateChange};
