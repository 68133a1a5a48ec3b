//! Application services for the machine registry.

mod machine_type;
mod registry;

pub use machine_type::{MachineTypeService, MachineTypeServiceError, MachineTypeServiceResult};
pub use registry::{
    MachineRegistryError, MachineRegistryResult, MachineRegistryService, RegisterMachineRequest,
    UpdateMachineRequest,
};
