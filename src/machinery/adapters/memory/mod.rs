//! In-memory machinery repositories for tests and embedded use.

mod machine;
mod machine_type;

pub use machine::InMemoryMachineRepository;
pub use machine_type::InMemoryMachineTypeRepository;
