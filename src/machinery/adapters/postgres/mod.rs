//! `PostgreSQL` adapters for machinery persistence.

mod models;
mod repository;
mod schema;

pub(crate) use repository::escape_like;
pub use repository::{MachineryPgPool, PostgresMachineRepository, PostgresMachineTypeRepository};
